use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const ROWS_PER_SPECIES: usize = 80;
const MEASUREMENTS: [&str; 4] = ["length", "width", "depth", "mass"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One synthetic row: measurements, then categorical columns, then a
/// trailing numeric score.
struct Row {
    measurements: [Option<f64>; 4],
    species: String,
    site: Option<String>,
    score: f64,
}

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    // Per-species means of the four measurements.
    let species = [
        ("setosa", [5.0, 3.4, 1.5, 0.25]),
        ("versicolor", [5.9, 2.8, 4.3, 1.3]),
        ("virginica", [6.6, 3.0, 5.6, 2.0]),
    ];
    let sites = ["north", "south", "east"];

    let mut rows = Vec::with_capacity(species.len() * ROWS_PER_SPECIES);
    for (name, means) in &species {
        for _ in 0..ROWS_PER_SPECIES {
            let mut measurements = [None; 4];
            for (slot, &mean) in measurements.iter_mut().zip(means) {
                // A few missing measurements.
                if !rng.chance(0.02) {
                    *slot = Some((rng.gauss(mean, 0.3) * 100.0).round() / 100.0);
                }
            }
            let site = if rng.chance(0.05) {
                None
            } else {
                Some(sites[(rng.next_u64() % sites.len() as u64) as usize].to_string())
            };
            rows.push(Row {
                measurements,
                species: name.to_string(),
                site,
                score: (rng.next_f64() * 1000.0).round() / 10.0,
            });
        }
    }
    rows
}

fn header() -> Vec<&'static str> {
    let mut header = MEASUREMENTS.to_vec();
    header.extend(["species", "site", "score"]);
    header
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(header())?;
    for row in rows {
        let mut record: Vec<String> = row
            .measurements
            .iter()
            .map(|m| m.map(|v| v.to_string()).unwrap_or_default())
            .collect();
        record.push(row.species.clone());
        record.push(row.site.clone().unwrap_or_default());
        record.push(row.score.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let mut fields = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();

    for (i, name) in MEASUREMENTS.iter().enumerate() {
        fields.push(Field::new(*name, DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.measurements[i]).collect::<Vec<_>>(),
        )));
    }
    fields.push(Field::new("species", DataType::Utf8, false));
    columns.push(Arc::new(StringArray::from(
        rows.iter().map(|r| r.species.as_str()).collect::<Vec<_>>(),
    )));
    fields.push(Field::new("site", DataType::Utf8, true));
    columns.push(Arc::new(StringArray::from(
        rows.iter().map(|r| r.site.as_deref()).collect::<Vec<_>>(),
    )));
    fields.push(Field::new("score", DataType::Float64, false));
    columns.push(Arc::new(Float64Array::from(
        rows.iter().map(|r| r.score).collect::<Vec<_>>(),
    )));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_csv(&rows, "sample_table.csv")?;
    write_parquet(&rows, "sample_table.parquet")?;

    println!(
        "Wrote {} rows ({} columns) to sample_table.csv and sample_table.parquet",
        rows.len(),
        header().len()
    );
    Ok(())
}
