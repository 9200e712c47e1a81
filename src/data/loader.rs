use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrow::util::pretty::pretty_format_batches;
use calamine::{Data, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Cell, RawTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` / `.txt` – delimited text with a header row
///   (tab-delimited when the header line contains a tab)
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.xlsx` / `.xls` / `.ods` – first worksheet, first row as header
/// * `.parquet` – flat Parquet file with scalar columns
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "tsv" | "txt" => load_delimited(path)?,
        "json" => load_json(path)?,
        "xlsx" | "xls" | "ods" => load_spreadsheet(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if table.header.is_empty() || table.is_empty() {
        bail!("{} contains no data rows", path.display());
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Tab when the first non-blank line contains a tab byte, comma otherwise.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    let file = std::fs::File::open(path).context("opening delimited file")?;
    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .context("reading header line")?;
        if read == 0 || !line.iter().all(u8::is_ascii_whitespace) {
            break;
        }
    }
    Ok(if line.contains(&b'\t') { b'\t' } else { b',' })
}

fn load_delimited(path: &Path) -> Result<RawTable> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .context("opening delimited file")?;

    let header: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().trim_matches('"').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        if record.iter().all(|field| field.trim().is_empty()) && record.len() <= 1 {
            continue;
        }
        rows.push(record.iter().map(Cell::parse).collect());
    }

    Ok(RawTable::new(header, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, e.g. `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "sepal_length": 5.1, "species": "setosa" },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen key order; keys missing from a record are
/// empty cells.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut header: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            header
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(Cell::Empty))
                .collect()
        })
        .collect();

    Ok(RawTable::new(header, rows))
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::Null => Cell::Empty,
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Cell::Number(f),
            _ => Cell::Text(n.to_string()),
        },
        JsonValue::String(s) => Cell::parse(s),
        JsonValue::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Load the first worksheet of an Excel or OpenDocument workbook. The first
/// row of the used range is the header; missing cells are empty.
fn load_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("Spreadsheet has no worksheets")?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading worksheet {sheet}"))?;

    let mut records = range.rows();
    let Some(header_row) = records.next() else {
        bail!("Worksheet {sheet} is empty");
    };
    let header: Vec<String> = header_row
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();

    let rows = records
        .map(|record| record.iter().map(sheet_cell).collect::<Vec<_>>())
        .filter(|cells| !cells.iter().all(Cell::is_empty))
        .collect();

    Ok(RawTable::new(header, rows))
}

fn sheet_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Float(f) => number_cell(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::String(s) => Cell::parse(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::parse(&other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file. Every top-level field becomes one column;
/// nulls become empty cells.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let header: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        if rows.is_empty() && log::log_enabled!(log::Level::Debug) {
            let preview = batch.slice(0, batch.num_rows().min(5));
            if let Ok(text) = pretty_format_batches(&[preview]) {
                log::debug!("parquet preview:\n{text}");
            }
        }

        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            rows.push(cells);
        }
    }

    Ok(RawTable::new(header, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Empty);
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| Cell::parse(a.value(row))),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| Cell::parse(a.value(row))),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| Cell::Number(a.value(row) as f64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| Cell::Number(a.value(row) as f64)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| number_cell(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| number_cell(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| Cell::Text(a.value(row).to_string())),
        _ => None,
    };

    match cell {
        Some(cell) => Ok(cell),
        None => {
            let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
                .with_context(|| format!("formatting {:?} value", col.data_type()))?;
            Ok(Cell::parse(&formatter.value(row).to_string()))
        }
    }
}

fn number_cell(v: f64) -> Cell {
    if v.is_finite() {
        Cell::Number(v)
    } else {
        Cell::Empty
    }
}
