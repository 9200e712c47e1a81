use super::params::{EmbeddingParams, Metric};
use super::projector::{Embedding, ProjectionError, Projector};
use crate::data::encode::{FeatureMatrix, MISSING_CODE};

/// Step size limit per force application, in layout units.
const MAX_STEP: f64 = 4.0;
const ATTRACTION: f64 = 0.5;
const REPULSION: f64 = 1.0;
/// Weight multiplier for edges joining two different known classes.
const CROSS_CLASS_WEIGHT: f64 = 0.05;
const INIT_SPREAD: f64 = 10.0;

// ---------------------------------------------------------------------------
// Neighbor-graph layout
// ---------------------------------------------------------------------------

/// Built-in projection backend: a k-nearest-neighbor graph laid out in 2-D
/// with edge attraction and negative-sample repulsion.
///
/// Deterministic for a given seed and input.
#[derive(Debug, Clone)]
pub struct NeighborLayout {
    pub seed: u64,
    pub negative_samples: usize,
}

impl Default for NeighborLayout {
    fn default() -> Self {
        Self {
            seed: 42,
            negative_samples: 5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    weight: f64,
}

impl Projector for NeighborLayout {
    fn project(
        &self,
        features: &FeatureMatrix,
        params: &EmbeddingParams,
        labels: Option<&[i64]>,
        on_epoch: &mut dyn FnMut(usize) -> bool,
    ) -> Result<Embedding, ProjectionError> {
        let n = features.len();
        if n < 2 || features.dims() == 0 {
            return Err(ProjectionError::InvalidInput(format!(
                "need at least 2 rows and 1 feature, got {n} x {}",
                features.dims()
            )));
        }
        params
            .validate()
            .map_err(|e| ProjectionError::InvalidInput(e.to_string()))?;

        let k = params.n_neighbors.min(n - 1);
        let mut edges = knn_edges(features, k, params.metric);
        if let Some(labels) = labels {
            apply_supervision(&mut edges, labels);
        }
        log::debug!("layout: {n} points, {} edges, k={k}", edges.len());

        let mut rng = SplitMix64::new(self.seed);
        let mut pos: Vec<[f64; 2]> = (0..n)
            .map(|_| {
                [
                    (rng.next_f64() - 0.5) * INIT_SPREAD,
                    (rng.next_f64() - 0.5) * INIT_SPREAD,
                ]
            })
            .collect();

        let epochs = params.epochs;
        for epoch in 1..=epochs {
            let alpha = 1.0 - (epoch - 1) as f64 / epochs as f64;

            for edge in &edges {
                attract(&mut pos, edge, alpha, params.min_dist);
            }
            for i in 0..n {
                for _ in 0..self.negative_samples {
                    let j = rng.below(n);
                    if j != i {
                        repel(&mut pos, i, j, alpha, &mut rng);
                    }
                }
            }

            if !on_epoch(epoch) {
                return Err(ProjectionError::Cancelled);
            }
        }

        if pos.iter().any(|p| !p[0].is_finite() || !p[1].is_finite()) {
            return Err(ProjectionError::Failed("layout diverged".into()));
        }
        Ok(pos)
    }
}

/// Directed k-nearest-neighbor edges weighted by `exp(-(d - rho) / sigma)`,
/// where `rho` is the point's nearest distance and `sigma` the mean excess.
fn knn_edges(features: &FeatureMatrix, k: usize, metric: Metric) -> Vec<Edge> {
    let n = features.len();
    let mut edges = Vec::with_capacity(n * k);

    for a in 0..n {
        let mut dists: Vec<(usize, f64)> = (0..n)
            .filter(|&b| b != a)
            .map(|b| (b, metric.distance(features.row(a), features.row(b))))
            .collect();
        dists.sort_by(|x, y| x.1.total_cmp(&y.1));
        dists.truncate(k);

        let rho = dists.first().map(|d| d.1).unwrap_or(0.0);
        let sigma = dists.iter().map(|d| d.1 - rho).sum::<f64>() / dists.len().max(1) as f64;
        let sigma = sigma.max(1e-9);

        edges.extend(dists.into_iter().map(|(b, d)| Edge {
            a,
            b,
            weight: (-(d - rho) / sigma).exp(),
        }));
    }
    edges
}

fn apply_supervision(edges: &mut [Edge], labels: &[i64]) {
    for edge in edges {
        let (la, lb) = (labels[edge.a], labels[edge.b]);
        if la != MISSING_CODE && lb != MISSING_CODE && la != lb {
            edge.weight *= CROSS_CLASS_WEIGHT;
        }
    }
}

fn attract(pos: &mut [[f64; 2]], edge: &Edge, alpha: f64, min_dist: f64) {
    let dx = pos[edge.b][0] - pos[edge.a][0];
    let dy = pos[edge.b][1] - pos[edge.a][1];
    let dist = (dx * dx + dy * dy).sqrt();
    if dist <= min_dist || dist == 0.0 {
        return;
    }
    let step = (alpha * ATTRACTION * edge.weight * (dist - min_dist)).min(MAX_STEP) * 0.5;
    let (ux, uy) = (dx / dist, dy / dist);
    pos[edge.a][0] += ux * step;
    pos[edge.a][1] += uy * step;
    pos[edge.b][0] -= ux * step;
    pos[edge.b][1] -= uy * step;
}

fn repel(pos: &mut [[f64; 2]], i: usize, j: usize, alpha: f64, rng: &mut SplitMix64) {
    let mut dx = pos[i][0] - pos[j][0];
    let mut dy = pos[i][1] - pos[j][1];
    if dx == 0.0 && dy == 0.0 {
        dx = (rng.next_f64() - 0.5) * 1e-3;
        dy = (rng.next_f64() - 0.5) * 1e-3;
    }
    let dist_sq = dx * dx + dy * dy;
    let dist = dist_sq.sqrt();
    let step = (alpha * REPULSION / (dist_sq + 0.1)).min(MAX_STEP);
    pos[i][0] += dx / dist * step;
    pos[i][1] += dy / dist * step;
}

/// Small deterministic PRNG (splitmix64).
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        SplitMix64 { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}
