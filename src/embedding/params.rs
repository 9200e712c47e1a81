use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Distance metric
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Euclidean,
    Cosine,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Euclidean, Metric::Cosine];

    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            Metric::Cosine => {
                let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
                let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
                if na == 0.0 || nb == 0.0 {
                    1.0
                } else {
                    (1.0 - dot / (na * nb)).max(0.0)
                }
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Euclidean => write!(f, "euclidean"),
            Metric::Cosine => write!(f, "cosine"),
        }
    }
}

// ---------------------------------------------------------------------------
// EmbeddingParams
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("neighbor count must be at least 2, got {0}")]
    Neighbors(usize),
    #[error("minimum distance must be in [0, 1), got {0}")]
    MinDist(f64),
    #[error("epoch count must be at least 1")]
    Epochs,
}

/// Projection parameters plus the render-only point size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddingParams {
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub epochs: usize,
    pub supervised: bool,
    /// Marker radius in points. Does not affect the projection.
    pub point_size: f32,
    pub metric: Metric,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.1,
            epochs: 400,
            supervised: false,
            point_size: 3.0,
            metric: Metric::Euclidean,
        }
    }
}

/// The subset of [`EmbeddingParams`] that a projection depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeKey {
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub epochs: usize,
    pub supervised: bool,
    pub metric: Metric,
}

impl EmbeddingParams {
    pub fn compute_key(&self) -> ComputeKey {
        ComputeKey {
            n_neighbors: self.n_neighbors,
            min_dist: self.min_dist,
            epochs: self.epochs,
            supervised: self.supervised,
            metric: self.metric,
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.n_neighbors < 2 {
            return Err(ParamsError::Neighbors(self.n_neighbors));
        }
        if !(0.0..1.0).contains(&self.min_dist) {
            return Err(ParamsError::MinDist(self.min_dist));
        }
        if self.epochs < 1 {
            return Err(ParamsError::Epochs);
        }
        Ok(())
    }
}

/// Percentage of `epochs` completed after `epoch`, clamped to `0..=100`.
pub fn progress_percent(epoch: usize, epochs: usize) -> u8 {
    if epochs == 0 {
        return 100;
    }
    let pct = (epoch as f64 / epochs as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
