use eframe::egui::Color32;

use crate::color::{ColorScale, MUTED, Marker, NEUTRAL, ShapeScale};
use crate::data::filter::{CrossFilter, emphasis_mask};
use crate::data::model::{Cell, RawTable};

/// Margin kept around the normalized embedding inside the unit square.
const MARGIN: f64 = 0.03;
pub const EMPHASIZED_OPACITY: f32 = 0.9;
pub const MUTED_OPACITY: f32 = 0.2;

// ---------------------------------------------------------------------------
// View transform (zoom / pan)
// ---------------------------------------------------------------------------

/// Per-axis scale plus translation, mapping normalized chart coordinates
/// `p` to view coordinates `k * p + t`. The view shows `[0, 1]²`.
///
/// Scroll zoom scales both axes alike; a pinch or a resized chart may not,
/// so each axis keeps its own factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub kx: f64,
    pub ky: f64,
    pub x: f64,
    pub y: f64,
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        kx: 1.0,
        ky: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        [self.kx * p[0] + self.x, self.ky * p[1] + self.y]
    }

    /// Region of normalized space visible through this transform.
    pub fn visible_bounds(&self) -> ([f64; 2], [f64; 2]) {
        let min = [-self.x / self.kx, -self.y / self.ky];
        let max = [(1.0 - self.x) / self.kx, (1.0 - self.y) / self.ky];
        (min, max)
    }

    /// Inverse of [`visible_bounds`](Self::visible_bounds).
    pub fn from_bounds(min: [f64; 2], max: [f64; 2]) -> Option<Self> {
        let width = max[0] - min[0];
        let height = max[1] - min[1];
        let usable = |span: f64, origin: f64| span.is_finite() && span > 0.0 && origin.is_finite();
        if !(usable(width, min[0]) && usable(height, min[1])) {
            return None;
        }
        let (kx, ky) = (1.0 / width, 1.0 / height);
        Some(ViewTransform {
            kx,
            ky,
            x: -min[0] * kx,
            y: -min[1] * ky,
        })
    }

    pub fn approx_eq(&self, other: &ViewTransform) -> bool {
        const EPS: f64 = 1e-9;
        (self.kx - other.kx).abs() < EPS
            && (self.ky - other.ky).abs() < EPS
            && (self.x - other.x).abs() < EPS
            && (self.y - other.y).abs() < EPS
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Cached pan/zoom. Survives re-renders and data updates; only
/// [`ViewState::reset`] returns to identity.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    transform: Option<ViewTransform>,
}

impl ViewState {
    pub fn transform(&self) -> ViewTransform {
        self.transform.unwrap_or_default()
    }

    /// Store the transform produced by a pan/zoom interaction.
    pub fn set(&mut self, transform: ViewTransform) {
        if !transform.approx_eq(&self.transform()) {
            self.transform = Some(transform);
        }
    }

    pub fn reset(&mut self) {
        self.transform = None;
    }

    pub fn is_identity(&self) -> bool {
        self.transform.is_none()
    }
}

// ---------------------------------------------------------------------------
// Normalization of embedding coordinates
// ---------------------------------------------------------------------------

/// Linear map from embedding extents onto the unit square (with margin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    min: [f64; 2],
    max: [f64; 2],
}

impl Normalizer {
    pub fn fit(points: &[[f64; 2]]) -> Self {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in points {
            for axis in 0..2 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Normalizer { min, max }
    }

    pub fn normalize(&self, p: [f64; 2]) -> [f64; 2] {
        let mut out = [0.5; 2];
        for axis in 0..2 {
            let span = self.max[axis] - self.min[axis];
            if span.is_finite() && span > 0.0 {
                out[axis] = MARGIN + (p[axis] - self.min[axis]) / span * (1.0 - 2.0 * MARGIN);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Render model
// ---------------------------------------------------------------------------

/// Appearance of one point, in normalized chart coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPoint {
    /// Original table row.
    pub row: usize,
    pub pos: [f64; 2],
    pub fill: Color32,
    pub opacity: f32,
    pub marker: Marker,
    pub emphasized: bool,
}

/// Encodings that style the chart, shared with the legends.
#[derive(Debug, Clone, Copy)]
pub struct Encoding<'a> {
    pub color_labels: Option<&'a [Cell]>,
    pub color_scale: Option<&'a ColorScale>,
    pub shape_labels: Option<&'a [Cell]>,
    pub shape_scale: Option<&'a ShapeScale>,
    pub filter: &'a CrossFilter,
}

/// Place and style every point. Filtering only restyles points, so the
/// output always has one entry per embedding row.
pub fn build_render_model(embedding: &[[f64; 2]], encoding: &Encoding<'_>) -> Vec<RenderPoint> {
    let normalizer = Normalizer::fit(embedding);
    let mask = emphasis_mask(
        embedding.len(),
        encoding.color_labels,
        encoding.shape_labels,
        encoding.filter,
    );

    embedding
        .iter()
        .enumerate()
        .map(|(row, &p)| {
            let emphasized = mask[row];
            let color_label = encoding.color_labels.and_then(|l| l.get(row));
            let shape_label = encoding.shape_labels.and_then(|l| l.get(row));

            let fill = if emphasized {
                color_label
                    .zip(encoding.color_scale)
                    .and_then(|(label, scale)| scale.color_for(label))
                    .unwrap_or(NEUTRAL)
            } else {
                MUTED
            };
            let marker = shape_label
                .zip(encoding.shape_scale)
                .map(|(label, scale)| scale.shape_for(label))
                .unwrap_or(Marker::Circle);

            RenderPoint {
                row,
                pos: normalizer.normalize(p),
                fill,
                opacity: if emphasized {
                    EMPHASIZED_OPACITY
                } else {
                    MUTED_OPACITY
                },
                marker,
                emphasized,
            }
        })
        .collect()
}

/// Index of the point nearest to `target` within `max_px` screen pixels.
/// `units_per_px` converts chart units to pixels per axis.
pub fn nearest_point(
    points: &[RenderPoint],
    target: [f64; 2],
    units_per_px: [f64; 2],
    max_px: f64,
) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let dx = (p.pos[0] - target[0]) / units_per_px[0].abs().max(f64::EPSILON);
            let dy = (p.pos[1] - target[1]) / units_per_px[1].abs().max(f64::EPSILON);
            (i, (dx * dx + dy * dy).sqrt())
        })
        .filter(|(_, d)| *d <= max_px)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Tooltip
// ---------------------------------------------------------------------------

/// Hover content for one point, read from the original row.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    /// Colour value text with its swatch.
    pub color: Option<(String, Color32)>,
    pub shape: Option<String>,
    /// `(header, value)` for each tooltip column with a non-empty value.
    pub extra: Vec<(String, String)>,
}

impl Tooltip {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.shape.is_none() && self.extra.is_empty()
    }
}

pub fn tooltip_for(
    table: &RawTable,
    point: &RenderPoint,
    encoding: &Encoding<'_>,
    tooltip_columns: &[usize],
) -> Tooltip {
    let row = point.row;
    let color = encoding
        .color_labels
        .and_then(|l| l.get(row))
        .filter(|c| !c.is_empty())
        .map(|label| {
            let text = match label {
                Cell::Number(v) => format!("{v:.2}"),
                other => other.to_string(),
            };
            let swatch = encoding
                .color_scale
                .and_then(|s| s.color_for(label))
                .unwrap_or(NEUTRAL);
            (text, swatch)
        });
    let shape = encoding
        .shape_labels
        .and_then(|l| l.get(row))
        .and_then(Cell::key);
    let extra = tooltip_columns
        .iter()
        .filter_map(|&col| {
            let header = table.header.get(col)?;
            let value = table.cell(row, col).filter(|c| !c.is_empty())?;
            Some((header.clone(), value.to_string()))
        })
        .collect();

    Tooltip {
        color,
        shape,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterAxis;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::parse(v)).collect()
    }

    #[test]
    fn bounds_round_trip_through_transform() {
        let t = ViewTransform {
            kx: 2.0,
            ky: 2.0,
            x: -0.5,
            y: -0.25,
        };
        let (min, max) = t.visible_bounds();
        assert_eq!(min, [0.25, 0.125]);
        assert_eq!(max, [0.75, 0.625]);
        assert!(ViewTransform::from_bounds(min, max).unwrap().approx_eq(&t));
        assert_eq!(t.apply([0.25, 0.125]), [0.0, 0.0]);
    }

    #[test]
    fn uneven_zoom_keeps_both_extents() {
        // Horizontal span 0.5, vertical span 0.25.
        let min = [0.25, 0.5];
        let max = [0.75, 0.75];
        let t = ViewTransform::from_bounds(min, max).unwrap();
        assert_eq!((t.kx, t.ky), (2.0, 4.0));
        let (back_min, back_max) = t.visible_bounds();
        for axis in 0..2 {
            assert!((back_min[axis] - min[axis]).abs() < 1e-12);
            assert!((back_max[axis] - max[axis]).abs() < 1e-12);
        }
        assert_eq!(t.apply([0.75, 0.75]), [1.0, 1.0]);
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        assert_eq!(ViewTransform::from_bounds([1.0, 0.0], [1.0, 1.0]), None);
        assert_eq!(ViewTransform::from_bounds([0.0, 1.0], [1.0, 1.0]), None);
        assert_eq!(ViewTransform::from_bounds([0.0, f64::NAN], [1.0, 1.0]), None);
    }

    #[test]
    fn view_state_persists_until_reset() {
        let mut view = ViewState::default();
        assert!(view.is_identity());
        let t = ViewTransform {
            kx: 3.0,
            ky: 3.0,
            x: 0.1,
            y: 0.2,
        };
        view.set(t);
        assert_eq!(view.transform(), t);
        view.set(t);
        assert_eq!(view.transform(), t);
        view.reset();
        assert_eq!(view.transform(), ViewTransform::IDENTITY);
    }

    #[test]
    fn normalizer_maps_extents_inside_margin() {
        let n = Normalizer::fit(&[[-2.0, 10.0], [2.0, 30.0]]);
        assert_eq!(n.normalize([-2.0, 10.0]), [MARGIN, MARGIN]);
        let top = n.normalize([2.0, 30.0]);
        assert!((top[0] - (1.0 - MARGIN)).abs() < 1e-12);
        assert_eq!(Normalizer::fit(&[[1.0, 1.0]]).normalize([1.0, 1.0]), [0.5, 0.5]);
    }

    #[test]
    fn filtered_points_are_muted_not_removed() {
        let embedding = vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.5]];
        let colors = cells(&["A", "B", ""]);
        let scale = ColorScale::from_labels(&colors);
        let mut filter = CrossFilter::default();
        filter.toggle(FilterAxis::Color, "B");
        let encoding = Encoding {
            color_labels: Some(colors.as_slice()),
            color_scale: Some(&scale),
            shape_labels: None,
            shape_scale: None,
            filter: &filter,
        };
        let points = build_render_model(&embedding, &encoding);
        assert_eq!(points.len(), 3);
        assert!(!points[0].emphasized);
        assert_eq!(points[0].fill, MUTED);
        assert_eq!(points[0].opacity, MUTED_OPACITY);
        assert!(points[1].emphasized);
        assert_eq!(points[1].fill, scale.color_for(&colors[1]).unwrap());
        assert!(!points[2].emphasized);
    }

    #[test]
    fn unlabelled_emphasized_points_are_neutral_circles() {
        let embedding = vec![[0.0, 0.0], [1.0, 1.0]];
        let shapes = cells(&["s", ""]);
        let shape_scale = ShapeScale::from_labels(&shapes);
        let filter = CrossFilter::default();
        let encoding = Encoding {
            color_labels: None,
            color_scale: None,
            shape_labels: Some(shapes.as_slice()),
            shape_scale: Some(&shape_scale),
            filter: &filter,
        };
        let points = build_render_model(&embedding, &encoding);
        assert_eq!(points[0].fill, NEUTRAL);
        assert_eq!(points[1].marker, Marker::Circle);
        assert_eq!(points[0].opacity, EMPHASIZED_OPACITY);
    }

    #[test]
    fn nearest_point_respects_pick_radius() {
        let filter = CrossFilter::default();
        let encoding = Encoding {
            color_labels: None,
            color_scale: None,
            shape_labels: None,
            shape_scale: None,
            filter: &filter,
        };
        let points = build_render_model(&[[0.0, 0.0], [1.0, 1.0]], &encoding);
        let px = [0.001, 0.001];
        assert_eq!(nearest_point(&points, [0.031, 0.03], px, 8.0), Some(0));
        assert_eq!(nearest_point(&points, [0.5, 0.5], px, 8.0), None);
    }

    #[test]
    fn tooltip_reads_raw_row_values() {
        let table = RawTable::new(
            vec!["x".into(), "name".into(), "group".into(), "note".into()],
            vec![vec![
                Cell::Number(1.23456),
                Cell::Text("alpha".into()),
                Cell::Text("g1".into()),
                Cell::Empty,
            ]],
        );
        let colors = table.column_values(0);
        let scale = ColorScale::from_labels(&colors);
        let shapes = table.column_values(2);
        let filter = CrossFilter::default();
        let encoding = Encoding {
            color_labels: Some(colors.as_slice()),
            color_scale: Some(&scale),
            shape_labels: Some(shapes.as_slice()),
            shape_scale: None,
            filter: &filter,
        };
        let points = build_render_model(&[[0.0, 0.0]], &encoding);
        let tip = tooltip_for(&table, &points[0], &encoding, &[1, 3]);
        assert_eq!(tip.color.as_ref().map(|c| c.0.as_str()), Some("1.23"));
        assert_eq!(tip.shape.as_deref(), Some("g1"));
        assert_eq!(tip.extra, vec![("name".to_string(), "alpha".to_string())]);
    }
}
