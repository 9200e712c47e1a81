use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::infer::ColumnInfo;
use crate::state::AppState;
use crate::ui::legend;

fn describe(column: &ColumnInfo) -> String {
    if column.is_numeric() {
        format!("{}  (numeric)", column.name)
    } else {
        format!("{}  ({} values)", column.name, column.distinct)
    }
}

fn column_name(state: &AppState, column: Option<usize>) -> String {
    column
        .and_then(|c| state.catalog.get(c))
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "None".to_string())
}

// ---------------------------------------------------------------------------
// Left side panel – data, features, supervision
// ---------------------------------------------------------------------------

/// Render the left panel: table summary, feature checklist and supervision.
pub fn data_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data");
    ui.separator();

    let Some(table) = &state.table else {
        ui.label("No table loaded.");
        return;
    };
    ui.label(format!("{} rows, {} columns", table.len(), table.width()));

    // Clone what we need so we can mutate state inside the loops.
    let candidates: Vec<ColumnInfo> = state
        .catalog
        .feature_candidates()
        .into_iter()
        .cloned()
        .collect();
    let categorical: Vec<ColumnInfo> = state
        .catalog
        .categorical_columns()
        .into_iter()
        .cloned()
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new(
                RichText::new(format!(
                    "Features  ({}/{})",
                    state.feature_columns.len(),
                    candidates.len()
                ))
                .strong(),
            )
            .id_salt("features")
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for column in &candidates {
                    let mut checked = state.feature_columns.contains(&column.index);
                    if ui.checkbox(&mut checked, describe(column)).changed() {
                        state.toggle_feature(column.index);
                    }
                }
            });

            ui.separator();
            ui.strong("Supervision");
            let mut supervised = state.params.supervised;
            if ui.checkbox(&mut supervised, "Supervised").changed() {
                state.set_supervised(supervised);
            }

            ui.add_enabled_ui(state.params.supervised, |ui: &mut Ui| {
                let current = state.supervised_column;
                egui::ComboBox::from_id_salt("label_column")
                    .selected_text(column_name(state, current))
                    .show_ui(ui, |ui: &mut Ui| {
                        if ui.selectable_label(current.is_none(), "None").clicked() {
                            state.set_supervised_column(None);
                        }
                        for column in &categorical {
                            let selected = current == Some(column.index);
                            if ui.selectable_label(selected, column.name.as_str()).clicked() {
                                state.set_supervised_column(Some(column.index));
                            }
                        }
                    });
            });

            if state.params.supervised {
                let rows = state.features().len();
                if state.supervised_column.is_none() {
                    ui.small("No categorical column available.");
                } else if !state.labels().is_usable_for(rows) && state.labels().codes().is_some() {
                    ui.small("Fewer than two label classes, supervision is skipped.");
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Right side panel – encodings, legends, tooltip columns
// ---------------------------------------------------------------------------

/// Render the right panel: colour / shape pickers with their legends and
/// the tooltip column checklist.
pub fn encoding_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Encoding");
    ui.separator();

    if state.table.is_none() {
        ui.label("No table loaded.");
        return;
    }

    let all_columns: Vec<ColumnInfo> = state.catalog.columns().to_vec();
    let categorical: Vec<ColumnInfo> = state
        .catalog
        .categorical_columns()
        .into_iter()
        .cloned()
        .collect();
    let candidates: Vec<ColumnInfo> = state
        .catalog
        .feature_candidates()
        .into_iter()
        .cloned()
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Colour-by selector ----
            ui.strong("Color by");
            let current = state.color_column();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(column_name(state, current))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui.selectable_label(current.is_none(), "None").clicked() {
                        state.set_color_column(None);
                    }
                    for column in &all_columns {
                        if ui
                            .selectable_label(current == Some(column.index), column.name.as_str())
                            .clicked()
                        {
                            state.set_color_column(Some(column.index));
                        }
                    }
                });
            legend::color_legend(ui, state);
            ui.separator();

            // ---- Shape-by selector ----
            ui.strong("Shape by");
            let current = state.shape_column();
            egui::ComboBox::from_id_salt("shape_by")
                .selected_text(column_name(state, current))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui.selectable_label(current.is_none(), "None").clicked() {
                        state.set_shape_column(None);
                    }
                    for column in &categorical {
                        if ui
                            .selectable_label(current == Some(column.index), column.name.as_str())
                            .clicked()
                        {
                            state.set_shape_column(Some(column.index));
                        }
                    }
                });
            legend::shape_legend(ui, state);
            ui.separator();

            egui::CollapsingHeader::new(RichText::new("Tooltip columns").strong())
                .id_salt("tooltip_columns")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for column in &candidates {
                        let mut checked = state.tooltip_columns.contains(&column.index);
                        if ui.checkbox(&mut checked, column.name.as_str()).changed() {
                            state.toggle_tooltip(column.index);
                        }
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(table), Some(name)) = (&state.table, &state.file_name) {
            ui.label(format!("{name}: {} rows", table.len()));
            ui.separator();
        }

        if let Some(run) = state.orchestrator.published_run() {
            ui.label(RichText::new(format!("embedding #{run}")).weak());
            ui.separator();
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open table")
        .add_filter(
            "Supported files",
            &["csv", "tsv", "txt", "json", "xlsx", "xls", "ods", "parquet", "pq"],
        )
        .add_filter("Delimited text", &["csv", "tsv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Spreadsheet", &["xlsx", "xls", "ods"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
