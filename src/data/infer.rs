use std::collections::HashSet;

use super::model::RawTable;

// ---------------------------------------------------------------------------
// Column classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Classify a column: numeric iff every non-empty cell is a finite number.
/// A single text cell makes the whole column categorical.
pub fn classify_column(table: &RawTable, column: usize) -> ColumnKind {
    let numeric = table
        .column(column)
        .filter(|c| !c.is_empty())
        .all(|c| c.as_number().is_some());
    if numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Derived facts about one column of a [`RawTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub index: usize,
    pub name: String,
    pub kind: ColumnKind,
    /// Distinct non-empty values (only counted for categorical columns).
    pub distinct: usize,
}

impl ColumnInfo {
    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }
}

// ---------------------------------------------------------------------------
// ColumnCatalog
// ---------------------------------------------------------------------------

/// Per-column classification of a loaded table, recomputed whenever the
/// table is replaced. Drives default feature selection and the pickers.
#[derive(Debug, Clone, Default)]
pub struct ColumnCatalog {
    columns: Vec<ColumnInfo>,
    rows: usize,
}

impl ColumnCatalog {
    pub fn infer(table: &RawTable) -> Self {
        let columns = table
            .header
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let kind = classify_column(table, index);
                let distinct = match kind {
                    ColumnKind::Numeric => 0,
                    ColumnKind::Categorical => table
                        .column(index)
                        .filter_map(|c| c.key())
                        .collect::<HashSet<_>>()
                        .len(),
                };
                ColumnInfo {
                    index,
                    name: name.clone(),
                    kind,
                    distinct,
                }
            })
            .collect();
        ColumnCatalog {
            columns,
            rows: table.len(),
        }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn get(&self, index: usize) -> Option<&ColumnInfo> {
        self.columns.get(index)
    }

    /// Columns that may contribute a feature dimension: numeric ones, and
    /// categorical ones with at least one and at most `rows` distinct values.
    pub fn feature_candidates(&self) -> Vec<&ColumnInfo> {
        if self.rows == 0 {
            return Vec::new();
        }
        self.columns
            .iter()
            .filter(|c| c.is_numeric() || (c.distinct > 0 && c.distinct <= self.rows))
            .collect()
    }

    /// Default feature selection: the leading run of numeric candidates in
    /// header order, stopping at the first categorical one even if numeric
    /// columns follow it.
    pub fn default_feature_selection(&self) -> Vec<usize> {
        self.feature_candidates()
            .into_iter()
            .take_while(|c| c.is_numeric())
            .map(|c| c.index)
            .collect()
    }

    /// Columns failing the numeric test (shape and supervision pickers).
    pub fn categorical_columns(&self) -> Vec<&ColumnInfo> {
        if self.rows == 0 {
            return Vec::new();
        }
        self.columns.iter().filter(|c| !c.is_numeric()).collect()
    }
}
