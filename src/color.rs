use std::collections::HashMap;

use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

use crate::data::model::Cell;

/// Fill for emphasized points that have no colour label.
pub const NEUTRAL: Color32 = Color32::from_rgb(0x11, 0x18, 0x27);
/// Fill for de-emphasized points.
pub const MUTED: Color32 = Color32::from_rgb(0xcc, 0xcc, 0xcc);

/// Fixed categorical palette (category10), assigned in first-seen order.
pub const CATEGORY10: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

const VIRIDIS: [(u8, u8, u8); 9] = [
    (0x44, 0x01, 0x54),
    (0x47, 0x2c, 0x7a),
    (0x3b, 0x51, 0x8b),
    (0x2c, 0x71, 0x8e),
    (0x21, 0x90, 0x8d),
    (0x27, 0xad, 0x81),
    (0x5c, 0xc8, 0x63),
    (0xaa, 0xdc, 0x32),
    (0xfd, 0xe7, 0x25),
];

/// Sample the viridis ramp at `t ∈ [0, 1]`, mixing stops in linear RGB.
pub fn viridis(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 } as f32;
    let scaled = t * (VIRIDIS.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lo as f32;

    let to_linear = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
        Srgb::new(r, g, b).into_format::<f32>().into_linear()
    };
    let mixed = to_linear(VIRIDIS[lo]).mix(to_linear(VIRIDIS[lo + 1]), frac);
    let rgb: Srgb<f32> = Srgb::from_linear(mixed);
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Ordinal scale: category key → range value
// ---------------------------------------------------------------------------

/// Maps distinct non-empty labels, in first-occurrence order, onto a fixed
/// range. Label `i` receives `range[i % range.len()]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalScale<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T: Copy> OrdinalScale<T> {
    pub fn from_labels(labels: &[Cell], range: &[T]) -> Self {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        if range.is_empty() {
            return OrdinalScale { entries, index };
        }
        for key in labels.iter().filter_map(Cell::key) {
            if !index.contains_key(&key) {
                let value = range[entries.len() % range.len()];
                index.insert(key.clone(), entries.len());
                entries.push((key, value));
            }
        }
        OrdinalScale { entries, index }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    /// Legend entries in assignment order.
    pub fn entries(&self) -> &[(String, T)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Colour scale
// ---------------------------------------------------------------------------

/// Colour encoding shared by the chart, legend and tooltip.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    Categorical(OrdinalScale<Color32>),
    /// Viridis ramp over the numeric labels' range.
    Continuous { min: f64, max: f64 },
}

impl ColorScale {
    /// Continuous when any label is numeric, categorical otherwise.
    pub fn from_labels(labels: &[Cell]) -> Self {
        let numeric: Vec<f64> = labels.iter().filter_map(Cell::as_number).collect();
        if numeric.is_empty() {
            return ColorScale::Categorical(OrdinalScale::from_labels(labels, &CATEGORY10));
        }
        let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        ColorScale::Continuous { min, max }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, ColorScale::Continuous { .. })
    }

    /// Colour for a label; `None` for empty labels, unknown categories and
    /// text values under a continuous scale.
    pub fn color_for(&self, label: &Cell) -> Option<Color32> {
        match self {
            ColorScale::Categorical(scale) => label.key().and_then(|k| scale.get(&k)),
            ColorScale::Continuous { min, max } => {
                let v = label.as_number()?;
                let span = max - min;
                let t = if span.abs() < f64::EPSILON {
                    0.5
                } else {
                    (v - min) / span
                };
                Some(viridis(t))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shape scale
// ---------------------------------------------------------------------------

/// Marker shapes, in assignment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Circle,
    Triangle,
    Square,
    Diamond,
    Star,
    Plus,
    Cross,
}

pub const SHAPES: [Marker; 7] = [
    Marker::Circle,
    Marker::Triangle,
    Marker::Square,
    Marker::Diamond,
    Marker::Star,
    Marker::Plus,
    Marker::Cross,
];

/// Outline of a marker of unit radius centred on the origin, y pointing down.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerGeometry {
    Circle,
    Polygon(Vec<[f32; 2]>),
    Strokes(Vec<[[f32; 2]; 2]>),
}

impl Marker {
    pub fn geometry(self) -> MarkerGeometry {
        const S: f32 = 0.707;
        match self {
            Marker::Circle => MarkerGeometry::Circle,
            Marker::Triangle => {
                MarkerGeometry::Polygon(vec![[0.0, -1.0], [0.866, 0.5], [-0.866, 0.5]])
            }
            Marker::Square => {
                MarkerGeometry::Polygon(vec![[-S, -S], [S, -S], [S, S], [-S, S]])
            }
            Marker::Diamond => {
                MarkerGeometry::Polygon(vec![[0.0, -1.0], [1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]])
            }
            Marker::Star => MarkerGeometry::Strokes(vec![
                [[0.0, -1.0], [0.0, 1.0]],
                [[-0.866, -0.5], [0.866, 0.5]],
                [[-0.866, 0.5], [0.866, -0.5]],
            ]),
            Marker::Plus => {
                MarkerGeometry::Strokes(vec![[[0.0, -1.0], [0.0, 1.0]], [[-1.0, 0.0], [1.0, 0.0]]])
            }
            Marker::Cross => MarkerGeometry::Strokes(vec![[[-S, -S], [S, S]], [[-S, S], [S, -S]]]),
        }
    }
}

/// Categorical shape encoding. Shapes repeat cyclically once the distinct
/// labels outnumber [`SHAPES`]: the 8th label is a circle again.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeScale(OrdinalScale<Marker>);

impl ShapeScale {
    pub fn from_labels(labels: &[Cell]) -> Self {
        ShapeScale(OrdinalScale::from_labels(labels, &SHAPES))
    }

    /// Shape for a label; unlabelled points are circles.
    pub fn shape_for(&self, label: &Cell) -> Marker {
        label
            .key()
            .and_then(|k| self.0.get(&k))
            .unwrap_or(Marker::Circle)
    }

    pub fn entries(&self) -> &[(String, Marker)] {
        self.0.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::parse(v)).collect()
    }

    #[test]
    fn categorical_colors_follow_first_occurrence() {
        let scale = ColorScale::from_labels(&cells(&["b", "a", "b", "", "c"]));
        let ColorScale::Categorical(ordinal) = &scale else {
            panic!("expected categorical scale");
        };
        let keys: Vec<&str> = ordinal.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(scale.color_for(&Cell::parse("b")), Some(CATEGORY10[0]));
        assert_eq!(scale.color_for(&Cell::parse("a")), Some(CATEGORY10[1]));
        assert_eq!(scale.color_for(&Cell::Empty), None);
    }

    #[test]
    fn any_numeric_label_makes_scale_continuous() {
        let scale = ColorScale::from_labels(&cells(&["x", "2", "10"]));
        assert_eq!(scale, ColorScale::Continuous { min: 2.0, max: 10.0 });
        assert_eq!(scale.color_for(&Cell::Number(2.0)), Some(viridis(0.0)));
        assert_eq!(scale.color_for(&Cell::Number(10.0)), Some(viridis(1.0)));
        assert_eq!(scale.color_for(&Cell::parse("x")), None);
    }

    #[test]
    fn viridis_endpoints_match_stops() {
        assert_eq!(viridis(0.0), Color32::from_rgb(0x44, 0x01, 0x54));
        assert_eq!(viridis(1.0), Color32::from_rgb(0xfd, 0xe7, 0x25));
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(f64::NAN), viridis(0.0));
    }

    #[test]
    fn degenerate_range_uses_midpoint() {
        let scale = ColorScale::from_labels(&cells(&["4", "4"]));
        assert_eq!(scale.color_for(&Cell::Number(4.0)), Some(viridis(0.5)));
    }

    #[test]
    fn category_palette_wraps_after_ten() {
        let labels: Vec<Cell> = (0..12).map(|i| Cell::Text(format!("c{i}"))).collect();
        let scale = ColorScale::from_labels(&labels);
        assert_eq!(scale.color_for(&Cell::parse("c10")), Some(CATEGORY10[0]));
        assert_eq!(scale.color_for(&Cell::parse("c11")), Some(CATEGORY10[1]));
    }

    #[test]
    fn shapes_wrap_cyclically() {
        let labels: Vec<Cell> = (0..9).map(|i| Cell::Text(format!("s{i}"))).collect();
        let scale = ShapeScale::from_labels(&labels);
        assert_eq!(scale.shape_for(&Cell::parse("s0")), Marker::Circle);
        assert_eq!(scale.shape_for(&Cell::parse("s6")), Marker::Cross);
        assert_eq!(scale.shape_for(&Cell::parse("s7")), Marker::Circle);
        assert_eq!(scale.shape_for(&Cell::parse("s8")), Marker::Triangle);
        assert_eq!(scale.entries().len(), 9);
    }

    #[test]
    fn unlabelled_shape_is_circle() {
        let scale = ShapeScale::from_labels(&cells(&["p", "q"]));
        assert_eq!(scale.shape_for(&Cell::Empty), Marker::Circle);
        assert_eq!(scale.shape_for(&Cell::parse("q")), Marker::Triangle);
    }
}
