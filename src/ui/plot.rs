use std::collections::BTreeMap;

use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{MarkerShape, Plot, PlotBounds, Points};

use crate::color::Marker;
use crate::embedding::params::Metric;
use crate::export::{self, PngRequest};
use crate::state::AppState;
use crate::view::{RenderPoint, Tooltip, ViewTransform, nearest_point, tooltip_for};

/// Pointer distance, in screen points, within which a marker is hovered.
const PICK_RADIUS: f64 = 8.0;

/// UI-only chart state that is not part of the application model.
#[derive(Debug, Default)]
pub struct ChartUi {
    pub settings_open: bool,
    /// Screen rectangle of the plot in the last frame.
    pub plot_rect: Option<egui::Rect>,
}

fn marker_shape(marker: Marker) -> MarkerShape {
    match marker {
        Marker::Circle => MarkerShape::Circle,
        Marker::Triangle => MarkerShape::Up,
        Marker::Square => MarkerShape::Square,
        Marker::Diamond => MarkerShape::Diamond,
        Marker::Star => MarkerShape::Asterisk,
        Marker::Plus => MarkerShape::Plus,
        Marker::Cross => MarkerShape::Cross,
    }
}

fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

// ---------------------------------------------------------------------------
// Embedding chart (central panel)
// ---------------------------------------------------------------------------

/// Render the toolbar and the scatter plot in the central panel.
pub fn embedding_chart(ui: &mut Ui, state: &mut AppState, chart: &mut ChartUi) {
    if state.table.is_none() {
        chart.plot_rect = None;
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a table to explore its embedding  (File → Open…)");
        });
        return;
    }

    let points = state.render_points();
    toolbar(ui, state, chart, points.as_deref());
    settings_window(ui.ctx(), state, chart);
    ui.separator();

    if let Some(reason) = state.selection_error() {
        chart.plot_rect = None;
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new(reason.to_string()).weak());
        });
        return;
    }

    let Some(points) = points else {
        chart.plot_rect = None;
        loading_indicator(ui, state);
        return;
    };

    scatter(ui, state, chart, &points);
}

fn loading_indicator(ui: &mut Ui, state: &AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(ui.available_height() * 0.4);
        if state.orchestrator.is_busy() {
            ui.label("Calculating embedding...");
            let progress = state.orchestrator.progress() as f32 / 100.0;
            ui.add(
                egui::ProgressBar::new(progress)
                    .desired_width(240.0)
                    .show_percentage(),
            );
        } else {
            ui.label(RichText::new("No embedding yet.").weak());
        }
    });
}

fn toolbar(ui: &mut Ui, state: &mut AppState, chart: &mut ChartUi, points: Option<&[RenderPoint]>) {
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(!state.view.is_identity(), egui::Button::new("Reset view"))
            .clicked()
        {
            state.reset_view();
        }

        let exportable = points.is_some() && chart.plot_rect.is_some();
        if ui.add_enabled(exportable, egui::Button::new("Export PNG")).clicked() {
            request_png(ui.ctx(), chart);
        }
        if ui.add_enabled(exportable, egui::Button::new("Export SVG")).clicked() {
            if let (Some(points), Some(rect)) = (points, chart.plot_rect) {
                export_svg(state, points, rect);
            }
        }

        if ui.selectable_label(chart.settings_open, "Settings").clicked() {
            chart.settings_open = !chart.settings_open;
        }

        if state.orchestrator.is_busy() && points.is_some() {
            ui.separator();
            ui.spinner();
            ui.label(format!("Calculating... {}%", state.orchestrator.progress()));
        }
    });
}

fn request_png(ctx: &egui::Context, chart: &ChartUi) {
    let Some(rect) = chart.plot_rect else {
        return;
    };
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export PNG")
        .add_filter("PNG", &["png"])
        .set_file_name("embedding.png")
        .save_file()
    else {
        return;
    };
    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::new(
        PngRequest { path, rect },
    )));
}

fn export_svg(state: &mut AppState, points: &[RenderPoint], rect: egui::Rect) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export SVG")
        .add_filter("SVG", &["svg"])
        .set_file_name("embedding.svg")
        .save_file()
    else {
        return;
    };
    let svg = export::render_svg(
        points,
        state.view.transform(),
        rect.width() as f64,
        rect.height() as f64,
        state.params.point_size as f64,
    );
    if let Err(e) = export::save_svg(&svg, &path) {
        log::error!("SVG export failed: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}

// ---------------------------------------------------------------------------
// Scatter plot
// ---------------------------------------------------------------------------

fn scatter(ui: &mut Ui, state: &mut AppState, chart: &mut ChartUi, points: &[RenderPoint]) {
    // Muted points first so emphasized ones draw on top.
    let mut series: BTreeMap<(bool, u8, [u8; 4]), Vec<[f64; 2]>> = BTreeMap::new();
    let mut markers: BTreeMap<u8, Marker> = BTreeMap::new();
    for p in points {
        let shape_key = p.marker as u8;
        markers.insert(shape_key, p.marker);
        series
            .entry((p.emphasized, shape_key, with_opacity(p.fill, p.opacity).to_array()))
            .or_default()
            .push(p.pos);
    }

    let (min, max) = state.view.transform().visible_bounds();
    let radius = state.params.point_size;

    let response = Plot::new("embedding_chart")
        .show_axes(false)
        .show_grid(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));

            for ((_, shape_key, rgba), coords) in &series {
                let [r, g, b, a] = *rgba;
                let marker = markers.get(shape_key).copied().unwrap_or(Marker::Circle);
                plot_ui.points(
                    Points::new(coords.clone())
                        .shape(marker_shape(marker))
                        .radius(radius)
                        .filled(true)
                        .color(Color32::from_rgba_premultiplied(r, g, b, a)),
                );
            }

            let pointer = plot_ui.pointer_coordinate()?;
            let units_per_px = plot_ui.transform().dvalue_dpos();
            nearest_point(points, [pointer.x, pointer.y], units_per_px, PICK_RADIUS)
        });

    chart.plot_rect = Some(response.response.rect);

    let bounds = response.transform.bounds();
    if let Some(transform) = ViewTransform::from_bounds(bounds.min(), bounds.max()) {
        state.view.set(transform);
    }

    if let (Some(index), Some(table)) = (response.inner, state.table.clone()) {
        let tooltip = tooltip_for(&table, &points[index], &state.encoding(), &state.tooltip_columns);
        if !tooltip.is_empty() {
            response
                .response
                .on_hover_ui_at_pointer(|ui: &mut Ui| tooltip_ui(ui, &tooltip));
        }
    }
}

fn tooltip_ui(ui: &mut Ui, tooltip: &Tooltip) {
    if tooltip.color.is_some() || tooltip.shape.is_some() {
        ui.horizontal(|ui: &mut Ui| {
            if let Some((text, swatch)) = &tooltip.color {
                ui.label(RichText::new("■").color(*swatch));
                ui.strong(text);
            }
            if let Some(shape) = &tooltip.shape {
                ui.label(format!("({shape})"));
            }
        });
    }
    for (header, value) in &tooltip.extra {
        ui.label(format!("{header}: {value}"));
    }
}

// ---------------------------------------------------------------------------
// Settings window
// ---------------------------------------------------------------------------

fn settings_window(ctx: &egui::Context, state: &mut AppState, chart: &mut ChartUi) {
    let mut params = state.params;
    egui::Window::new("Settings")
        .open(&mut chart.settings_open)
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui: &mut Ui| {
            egui::Grid::new("settings_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label("Neighbors");
                    ui.add(egui::Slider::new(&mut params.n_neighbors, 2..=50));
                    ui.end_row();

                    ui.label("Min distance");
                    ui.add(egui::Slider::new(&mut params.min_dist, 0.0..=0.99).step_by(0.01));
                    ui.end_row();

                    ui.label("Epochs");
                    ui.add(egui::Slider::new(&mut params.epochs, 50..=1000).step_by(10.0));
                    ui.end_row();

                    ui.label("Point size");
                    ui.add(egui::Slider::new(&mut params.point_size, 1.0..=8.0));
                    ui.end_row();

                    ui.label("Metric");
                    egui::ComboBox::from_id_salt("metric")
                        .selected_text(params.metric.to_string())
                        .show_ui(ui, |ui: &mut Ui| {
                            for metric in Metric::ALL {
                                ui.selectable_value(&mut params.metric, metric, metric.to_string());
                            }
                        });
                    ui.end_row();
                });
        });
    if params != state.params {
        log::debug!("parameters changed: {params:?}");
        state.params = params;
    }
}
