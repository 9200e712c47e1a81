use eframe::egui::{self, Color32, Painter, Pos2, RichText, Sense, Stroke, Ui};

use crate::color::{ColorScale, Marker, MarkerGeometry, viridis};
use crate::data::filter::FilterAxis;
use crate::state::AppState;

const SWATCH: f32 = 12.0;

/// Paint a legend marker of `radius` points around `center`.
pub fn paint_marker(painter: &Painter, center: Pos2, radius: f32, marker: Marker, color: Color32) {
    let at = |v: [f32; 2]| center + egui::vec2(v[0] * radius, v[1] * radius);
    match marker.geometry() {
        MarkerGeometry::Circle => {
            painter.circle_filled(center, radius, color);
        }
        MarkerGeometry::Polygon(vertices) => {
            let points = vertices.into_iter().map(at).collect();
            painter.add(egui::Shape::convex_polygon(points, color, Stroke::NONE));
        }
        MarkerGeometry::Strokes(segments) => {
            for [a, b] in segments {
                painter.line_segment([at(a), at(b)], Stroke::new(1.5, color));
            }
        }
    }
}

fn dimmed(active: bool, color: Color32) -> Color32 {
    if active {
        color
    } else {
        color.gamma_multiply(0.3)
    }
}

// ---------------------------------------------------------------------------
// Colour legend
// ---------------------------------------------------------------------------

/// Gradient bar for continuous scales, one toggle per category otherwise.
pub fn color_legend(ui: &mut Ui, state: &mut AppState) {
    let Some(color) = state.color() else {
        return;
    };

    let entries = match &color.scale {
        ColorScale::Continuous { min, max } => {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(180.0, 14.0), Sense::hover());
            let steps = 32;
            let seg_w = rect.width() / steps as f32;
            for i in 0..steps {
                let t = i as f64 / (steps - 1) as f64;
                let x0 = rect.left() + seg_w * i as f32;
                let seg = egui::Rect::from_min_size(
                    egui::pos2(x0, rect.top()),
                    egui::vec2(seg_w + 1.0, rect.height()),
                );
                ui.painter().rect_filled(seg, 0.0, viridis(t));
            }
            ui.horizontal(|ui: &mut Ui| {
                ui.small(format!("{min:.2}"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
                    ui.small(format!("{max:.2}"));
                });
            });
            return;
        }
        ColorScale::Categorical(ordinal) => ordinal.entries().to_vec(),
    };

    for (label, swatch) in entries {
        let active = state.filter.is_active(FilterAxis::Color, &label);
        let clicked = ui
            .horizontal(|ui: &mut Ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(SWATCH, SWATCH), Sense::hover());
                ui.painter().rect_filled(rect, 2.0, dimmed(active, swatch));
                let text = RichText::new(&label).color(dimmed(active, ui.visuals().text_color()));
                ui.selectable_label(false, text).clicked()
            })
            .inner;
        if clicked {
            state.toggle_filter(FilterAxis::Color, &label);
        }
    }
}

// ---------------------------------------------------------------------------
// Shape legend
// ---------------------------------------------------------------------------

pub fn shape_legend(ui: &mut Ui, state: &mut AppState) {
    let Some(shape) = state.shape() else {
        return;
    };
    let entries = shape.scale.entries().to_vec();

    for (label, marker) in entries {
        let active = state.filter.is_active(FilterAxis::Shape, &label);
        let clicked = ui
            .horizontal(|ui: &mut Ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(SWATCH, SWATCH), Sense::hover());
                let ink = dimmed(active, ui.visuals().text_color());
                paint_marker(ui.painter(), rect.center(), SWATCH * 0.45, marker, ink);
                ui.selectable_label(false, RichText::new(&label).color(ink)).clicked()
            })
            .inner;
        if clicked {
            state.toggle_filter(FilterAxis::Shape, &label);
        }
    }
}
