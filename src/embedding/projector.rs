use thiserror::Error;

use super::params::EmbeddingParams;
use crate::data::encode::FeatureMatrix;

/// One `[x, y]` pair per feature row, index-aligned with the matrix.
pub type Embedding = Vec<[f64; 2]>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid projection input: {0}")]
    InvalidInput(String),
    #[error("projection stopped early")]
    Cancelled,
    #[error("projection failed: {0}")]
    Failed(String),
}

/// Black-box 2-D projection backend.
///
/// Implementations must call `on_epoch` at least once per epoch with the
/// 1-based number of completed epochs. A `false` return asks the backend to
/// stop early; honouring it is an optimisation only.
pub trait Projector: Send + Sync {
    fn project(
        &self,
        features: &FeatureMatrix,
        params: &EmbeddingParams,
        labels: Option<&[i64]>,
        on_epoch: &mut dyn FnMut(usize) -> bool,
    ) -> Result<Embedding, ProjectionError>;
}
