use eframe::egui;

use crate::config::Settings;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SkyfareApp {
    pub state: AppState,
}

impl SkyfareApp {
    /// Build the app and open the configured data file, if any.
    pub fn new(settings: Settings) -> Self {
        let data_path = settings.data_path.clone();
        let mut state = AppState::new(settings);
        if let Some(path) = data_path {
            state.open_path(&path);
        }
        Self { state }
    }
}

impl eframe::App for SkyfareApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: filtered bookings ----
        if self.state.dataset.is_some() {
            egui::TopBottomPanel::bottom("bookings_table")
                .resizable(true)
                .default_height(220.0)
                .show(ctx, |ui| {
                    table::bookings_table(ui, &self.state);
                });
        }

        // ---- Central panel: metrics + charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::headline(ui, &self.state);
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                plot::charts(ui, &self.state);
            });
        });
    }
}
