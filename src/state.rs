use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::color::{ColorScale, ShapeScale};
use crate::data::encode::{FeatureMatrix, LabelVector, build_features, build_labels};
use crate::data::filter::{CrossFilter, FilterAxis};
use crate::data::infer::ColumnCatalog;
use crate::data::model::{Cell, RawTable};
use crate::embedding::layout::NeighborLayout;
use crate::embedding::orchestrator::{Orchestrator, OrchestratorConfig, RunInputs};
use crate::embedding::params::EmbeddingParams;
use crate::embedding::projector::Projector;
use crate::view::{Encoding, RenderPoint, ViewState, build_render_model};

/// Reasons no projection can be shown. Not failures: the chart falls back
/// to a neutral state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("the table has no rows")]
    EmptyTable,
    #[error("select at least one feature column")]
    NoFeatureColumns,
}

/// Upstream values that force the feature matrix and label vector to be
/// rebuilt. Point size and the other projection parameters are not part of
/// it.
#[derive(Debug, Clone, PartialEq)]
struct DerivedKey {
    table_generation: u64,
    feature_columns: Vec<usize>,
    label_column: Option<usize>,
}

/// Labels of one encoding column with the scale built from them.
#[derive(Debug, Clone)]
pub struct EncodedColumn<S> {
    pub column: usize,
    pub labels: Vec<Cell>,
    pub scale: S,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until user loads a file).
    pub table: Option<Arc<RawTable>>,
    pub file_name: Option<String>,
    pub catalog: ColumnCatalog,
    table_generation: u64,

    /// Selected feature columns, in selection order.
    pub feature_columns: Vec<usize>,
    pub supervised_column: Option<usize>,
    pub tooltip_columns: Vec<usize>,
    pub params: EmbeddingParams,

    color: Option<EncodedColumn<ColorScale>>,
    shape: Option<EncodedColumn<ShapeScale>>,
    pub filter: CrossFilter,
    pub view: ViewState,

    features: Arc<FeatureMatrix>,
    labels: Arc<LabelVector>,
    derived_key: Option<DerivedKey>,

    pub orchestrator: Orchestrator,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(NeighborLayout::default()), OrchestratorConfig::default())
    }
}

impl AppState {
    pub fn new(projector: Arc<dyn Projector>, config: OrchestratorConfig) -> Self {
        Self {
            table: None,
            file_name: None,
            catalog: ColumnCatalog::default(),
            table_generation: 0,
            feature_columns: Vec::new(),
            supervised_column: None,
            tooltip_columns: Vec::new(),
            params: EmbeddingParams::default(),
            color: None,
            shape: None,
            filter: CrossFilter::default(),
            view: ViewState::default(),
            features: Arc::new(FeatureMatrix::default()),
            labels: Arc::new(LabelVector::default()),
            derived_key: None,
            orchestrator: Orchestrator::new(projector, config),
            status_message: None,
        }
    }

    /// Load a table from disk. On failure the current table stays loaded
    /// and the error is shown in the status line.
    pub fn load_path(&mut self, path: &Path) {
        match crate::data::loader::load_file(path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows x {} columns from {}",
                    table.len(),
                    table.width(),
                    path.display()
                );
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.set_table(table, Some(name));
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Replace the table wholesale and reset every selection derived from
    /// the previous one.
    pub fn set_table(&mut self, table: RawTable, file_name: Option<String>) {
        self.catalog = ColumnCatalog::infer(&table);
        self.feature_columns = self.catalog.default_feature_selection();
        self.supervised_column = None;
        self.params.supervised = false;
        self.tooltip_columns.clear();
        self.color = None;
        self.shape = None;
        self.filter = CrossFilter::default();
        self.view.reset();
        self.orchestrator.reset();
        self.derived_key = None;
        self.table_generation += 1;
        self.table = Some(Arc::new(table));
        self.file_name = file_name;
        self.status_message = None;
    }

    // ---- selections ------------------------------------------------------

    /// Add a feature column at the end of the selection, or remove it.
    pub fn toggle_feature(&mut self, column: usize) {
        if let Some(pos) = self.feature_columns.iter().position(|&c| c == column) {
            self.feature_columns.remove(pos);
        } else {
            self.feature_columns.push(column);
        }
    }

    pub fn toggle_tooltip(&mut self, column: usize) {
        if let Some(pos) = self.tooltip_columns.iter().position(|&c| c == column) {
            self.tooltip_columns.remove(pos);
        } else {
            self.tooltip_columns.push(column);
        }
    }

    /// Switch supervised mode. Turning it on without a label column picks
    /// the first categorical column.
    pub fn set_supervised(&mut self, on: bool) {
        self.params.supervised = on;
        if on && self.supervised_column.is_none() {
            self.supervised_column = self.catalog.categorical_columns().first().map(|c| c.index);
        }
    }

    pub fn set_supervised_column(&mut self, column: Option<usize>) {
        self.supervised_column = column;
    }

    pub fn color_column(&self) -> Option<usize> {
        self.color.as_ref().map(|c| c.column)
    }

    pub fn shape_column(&self) -> Option<usize> {
        self.shape.as_ref().map(|c| c.column)
    }

    pub fn color(&self) -> Option<&EncodedColumn<ColorScale>> {
        self.color.as_ref()
    }

    pub fn shape(&self) -> Option<&EncodedColumn<ShapeScale>> {
        self.shape.as_ref()
    }

    /// Set the colour column and rebuild its scale. Clears the colour filter.
    pub fn set_color_column(&mut self, column: Option<usize>) {
        if column == self.color_column() {
            return;
        }
        self.filter.clear(FilterAxis::Color);
        self.color = self.table.as_ref().zip(column).map(|(table, column)| {
            let labels = table.column_values(column);
            let scale = ColorScale::from_labels(&labels);
            EncodedColumn { column, labels, scale }
        });
    }

    /// Set the shape column and rebuild its scale. Clears the shape filter.
    pub fn set_shape_column(&mut self, column: Option<usize>) {
        if column == self.shape_column() {
            return;
        }
        self.filter.clear(FilterAxis::Shape);
        self.shape = self.table.as_ref().zip(column).map(|(table, column)| {
            let labels = table.column_values(column);
            let scale = ShapeScale::from_labels(&labels);
            EncodedColumn { column, labels, scale }
        });
    }

    /// Toggle one legend entry.
    pub fn toggle_filter(&mut self, axis: FilterAxis, label: &str) {
        self.filter.toggle(axis, label);
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
    }

    // ---- derived data ------------------------------------------------------

    pub fn features(&self) -> &Arc<FeatureMatrix> {
        &self.features
    }

    pub fn labels(&self) -> &Arc<LabelVector> {
        &self.labels
    }

    /// Why nothing can be projected right now, if anything.
    pub fn selection_error(&self) -> Option<SelectionError> {
        let table = self.table.as_ref()?;
        if table.is_empty() {
            Some(SelectionError::EmptyTable)
        } else if self.feature_columns.is_empty() {
            Some(SelectionError::NoFeatureColumns)
        } else {
            None
        }
    }

    fn derived_key(&self) -> DerivedKey {
        DerivedKey {
            table_generation: self.table_generation,
            feature_columns: self.feature_columns.clone(),
            label_column: if self.params.supervised {
                self.supervised_column
            } else {
                None
            },
        }
    }

    /// Rebuild the feature matrix and labels if their inputs changed, then
    /// report the current run inputs to the orchestrator. Call once per frame.
    pub fn sync(&mut self, now: Instant) {
        let Some(table) = self.table.clone() else {
            return;
        };

        let key = self.derived_key();
        if self.derived_key.as_ref() != Some(&key) {
            self.features = Arc::new(build_features(&table, &key.feature_columns));
            self.labels = Arc::new(build_labels(&table, key.label_column));
            log::debug!(
                "rebuilt features: {} rows x {} dims, {} label classes",
                self.features.len(),
                self.features.dims(),
                self.labels.distinct_classes()
            );
            self.derived_key = Some(key);
        }

        let scheduled = self.orchestrator.submit(
            RunInputs {
                features: Arc::clone(&self.features),
                labels: Arc::clone(&self.labels),
                params: self.params,
            },
            now,
        );
        if scheduled {
            log::debug!("projection scheduled");
        }
    }

    // ---- rendering -----------------------------------------------------------

    pub fn encoding(&self) -> Encoding<'_> {
        Encoding {
            color_labels: self.color.as_ref().map(|c| c.labels.as_slice()),
            color_scale: self.color.as_ref().map(|c| &c.scale),
            shape_labels: self.shape.as_ref().map(|c| c.labels.as_slice()),
            shape_scale: self.shape.as_ref().map(|c| &c.scale),
            filter: &self.filter,
        }
    }

    /// Styled points for the published embedding, if it matches the table.
    pub fn render_points(&self) -> Option<Vec<RenderPoint>> {
        let table = self.table.as_ref()?;
        let embedding = self.orchestrator.embedding()?;
        if embedding.len() != table.len() {
            return None;
        }
        Some(build_render_model(embedding, &self.encoding()))
    }
}
