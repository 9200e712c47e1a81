use std::collections::{HashMap, HashSet};

use super::infer::{ColumnKind, classify_column};
use super::model::{Cell, RawTable};

/// Code assigned to empty/missing cells by every categorical encoder.
pub const MISSING_CODE: i64 = -1;

// ---------------------------------------------------------------------------
// CategoryCodes – first-seen-wins string → integer mapping
// ---------------------------------------------------------------------------

/// Assigns integer codes to category keys in order of first appearance.
///
/// Built fresh for every column and every call; codes are only stable for a
/// given row order.
#[derive(Debug, Default)]
pub struct CategoryCodes {
    codes: HashMap<String, i64>,
}

impl CategoryCodes {
    pub fn code_for(&mut self, cell: &Cell) -> i64 {
        let Some(key) = cell.key() else {
            return MISSING_CODE;
        };
        let next = self.codes.len() as i64;
        *self.codes.entry(key).or_insert(next)
    }

    /// Encode a whole column in row order.
    pub fn encode<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Vec<i64> {
        let mut codes = CategoryCodes::default();
        cells.into_iter().map(|c| codes.code_for(c)).collect()
    }
}

// ---------------------------------------------------------------------------
// FeatureMatrix
// ---------------------------------------------------------------------------

/// One fixed-length numeric vector per table row, in row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    dims: usize,
}

impl FeatureMatrix {
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of feature columns.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Whether a projection can run on this matrix at all.
    pub fn is_computable(&self) -> bool {
        !self.rows.is_empty() && self.dims > 0
    }
}

/// Build the feature matrix from the selected columns, in selection order.
///
/// Fully numeric columns are cast directly (empty cells become `0.0`); any
/// other column is replaced by its first-seen category codes, with empty
/// cells coded [`MISSING_CODE`]. Indices outside the table are ignored.
pub fn build_features(table: &RawTable, feature_indices: &[usize]) -> FeatureMatrix {
    if table.is_empty() {
        return FeatureMatrix::default();
    }

    let columns: Vec<Vec<f64>> = feature_indices
        .iter()
        .filter(|&&idx| idx < table.width())
        .map(|&idx| match classify_column(table, idx) {
            ColumnKind::Numeric => table
                .column(idx)
                .map(|c| c.as_number().unwrap_or(0.0))
                .collect(),
            ColumnKind::Categorical => CategoryCodes::encode(table.column(idx))
                .into_iter()
                .map(|code| code as f64)
                .collect(),
        })
        .collect();

    let dims = columns.len();
    let rows = (0..table.len())
        .map(|r| columns.iter().map(|col| col[r]).collect())
        .collect();

    FeatureMatrix { rows, dims }
}

// ---------------------------------------------------------------------------
// LabelVector
// ---------------------------------------------------------------------------

/// Supervision labels, index-aligned with the feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelVector {
    /// No supervision column: `len` absent labels.
    Absent(usize),
    /// First-seen integer codes, [`MISSING_CODE`] for empty cells.
    Coded(Vec<i64>),
}

impl Default for LabelVector {
    fn default() -> Self {
        LabelVector::Absent(0)
    }
}

impl LabelVector {
    pub fn len(&self) -> usize {
        match self {
            LabelVector::Absent(n) => *n,
            LabelVector::Coded(codes) => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn codes(&self) -> Option<&[i64]> {
        match self {
            LabelVector::Absent(_) => None,
            LabelVector::Coded(codes) => Some(codes),
        }
    }

    /// Number of distinct non-missing codes.
    pub fn distinct_classes(&self) -> usize {
        self.codes()
            .map(|codes| {
                codes
                    .iter()
                    .filter(|&&c| c != MISSING_CODE)
                    .collect::<HashSet<_>>()
                    .len()
            })
            .unwrap_or(0)
    }

    /// Labels can supervise a projection over `rows` points only with at
    /// least two known classes and a matching length.
    pub fn is_usable_for(&self, rows: usize) -> bool {
        self.len() == rows && self.distinct_classes() >= 2
    }
}

/// Encode the supervision column, or return absent labels when there is none.
pub fn build_labels(table: &RawTable, column: Option<usize>) -> LabelVector {
    match column {
        Some(idx) if idx < table.width() => {
            LabelVector::Coded(CategoryCodes::encode(table.column(idx)))
        }
        _ => LabelVector::Absent(table.len()),
    }
}
