use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::embedding::orchestrator::OrchestratorEvent;
use crate::export::{self, PngRequest};
use crate::state::AppState;
use crate::ui::plot::ChartUi;
use crate::ui::{panels, plot};

/// Repaint interval while a projection is debouncing or running.
const BUSY_REPAINT: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EmbleApp {
    pub state: AppState,
    chart: ChartUi,
}

impl EmbleApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial: Option<PathBuf>) -> Self {
        let mut state = AppState::default();
        let ctx = cc.egui_ctx.clone();
        state.orchestrator.set_waker(move || ctx.request_repaint());
        if let Some(path) = initial {
            state.load_path(&path);
        }
        Self {
            state,
            chart: ChartUi::default(),
        }
    }

    fn handle_orchestrator_events(&mut self, now: Instant) {
        for event in self.state.orchestrator.poll(now) {
            match event {
                OrchestratorEvent::Failed { run, error } => {
                    log::warn!("run {run} produced no embedding: {error}");
                    self.state.status_message = Some(format!("Embedding failed: {error}"));
                }
                OrchestratorEvent::Published { .. } => {
                    if self
                        .state
                        .status_message
                        .as_deref()
                        .is_some_and(|m| m.starts_with("Embedding failed"))
                    {
                        self.state.status_message = None;
                    }
                }
                OrchestratorEvent::Started { .. } | OrchestratorEvent::Superseded { .. } => {}
            }
        }
    }

    fn handle_screenshot_events(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        for ev in events {
            if let egui::Event::Screenshot { image, user_data, .. } = ev {
                let Some(req) = user_data
                    .data
                    .as_ref()
                    .and_then(|u| u.downcast_ref::<PngRequest>().cloned())
                else {
                    continue;
                };
                if let Err(e) = export::save_png(&image, req.rect, ctx.pixels_per_point(), &req.path) {
                    log::error!("PNG export failed: {e:#}");
                    self.state.status_message = Some(format!("Error: {e:#}"));
                }
            }
        }
    }
}

impl eframe::App for EmbleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.handle_orchestrator_events(now);
        self.handle_screenshot_events(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: data and features ----
        egui::SidePanel::left("data_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::data_panel(ui, &mut self.state);
            });

        // ---- Right side panel: encodings and legends ----
        egui::SidePanel::right("encoding_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::encoding_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::embedding_chart(ui, &mut self.state, &mut self.chart);
        });

        self.state.sync(now);
        if self.state.orchestrator.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
    }
}
