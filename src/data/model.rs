use std::fmt;

// ---------------------------------------------------------------------------
// Cell – a single value of the loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell.
///
/// `Empty` is kept distinct from the literal text or number `0`: a missing
/// value encodes to the missing-category sentinel, a zero does not.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Interpret a raw text token from a delimited file.
    ///
    /// Surrounding whitespace and double quotes are stripped; finite numbers
    /// become [`Cell::Number`], everything else non-empty stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    /// The finite numeric value of this cell, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Category key used by encoders, scales and filters. `None` for empty cells.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Empty => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – the complete loaded table
// ---------------------------------------------------------------------------

/// Header plus rows, every row exactly `header.len()` cells wide.
///
/// Columns are identified by their position in `header` for the lifetime of
/// the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Build a table, padding short rows with [`Cell::Empty`] and truncating
    /// long ones to the header width.
    pub fn new(header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = header.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        RawTable { header, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// All cells of one column, in row order.
    pub fn column(&self, column: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(column).unwrap_or(&Cell::Empty))
    }

    /// Owned copy of one column, used for colour/shape label vectors.
    pub fn column_values(&self, column: usize) -> Vec<Cell> {
        self.column(column).cloned().collect()
    }
}
