use std::collections::BTreeSet;

use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::DATE_FORMAT;
use crate::state::AppState;

const ALL: &str = "All";

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    // Edit a copy; the state only refilters when it actually changed.
    let mut criteria = state.criteria.clone();
    let (first, last) = dataset
        .departure_range
        .unwrap_or_else(|| {
            let today = chrono::Local::now().date_naive();
            (today, today)
        });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            city_combo(ui, "origin", "Origin city", &mut criteria.origin, &dataset.origins);
            ui.add_space(4.0);
            city_combo(
                ui,
                "destination",
                "Destination city",
                &mut criteria.destination,
                &dataset.destinations,
            );
            ui.add_space(8.0);

            ui.strong("Departure date");
            date_bound(ui, "From", "date_from", &mut criteria.date_from, first);
            date_bound(ui, "To", "date_to", &mut criteria.date_to, last);

            if let (Some(from), Some(to)) = (criteria.date_from, criteria.date_to) {
                if from > to {
                    ui.label(RichText::new("Start date is after end date.").color(Color32::YELLOW));
                }
            }

            ui.add_space(8.0);
            if ui.button("Reset filters").clicked() {
                criteria = Default::default();
            }

            ui.separator();
            ui.strong("Dataset");
            if let Some(source) = &dataset.source {
                let name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| source.display().to_string());
                ui.label(name);
            }
            ui.label(format!("{} bookings loaded", dataset.len()));
            let dropped = dataset.drop_report.total_dropped();
            if dropped > 0 {
                let label = ui.label(format!("{dropped} invalid rows skipped"));
                label.on_hover_ui(|ui: &mut Ui| {
                    for (reason, count) in &dataset.drop_report.dropped {
                        ui.label(format!("{reason}: {count}"));
                    }
                });
            }
            if let Some((first, last)) = dataset.departure_range {
                ui.label(format!(
                    "Departures {} – {}",
                    first.format(DATE_FORMAT),
                    last.format(DATE_FORMAT)
                ));
            }

            if let Some(text) = &state.insights {
                ui.separator();
                ui.strong("Insights");
                ui.label(text.as_str());
            }
        });

    state.set_criteria(criteria);
}

fn city_combo(
    ui: &mut Ui,
    id: &str,
    label: &str,
    selected: &mut Option<String>,
    cities: &BTreeSet<String>,
) {
    ui.strong(label);
    let current = selected.clone().unwrap_or_else(|| ALL.to_string());
    egui::ComboBox::from_id_salt(id)
        .selected_text(current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(selected, None, ALL);
            for city in cities {
                ui.selectable_value(selected, Some(city.clone()), city.as_str());
            }
        });
}

/// Checkbox enabling an optional bound plus a date picker for it.
fn date_bound(ui: &mut Ui, label: &str, id: &str, bound: &mut Option<NaiveDate>, fallback: NaiveDate) {
    ui.horizontal(|ui: &mut Ui| {
        let mut enabled = bound.is_some();
        if ui.checkbox(&mut enabled, label).changed() {
            let current = bound.unwrap_or(fallback);
            *bound = enabled.then_some(current);
        }
        if let Some(date) = bound.as_mut() {
            ui.add(DatePickerButton::new(date).id_salt(id));
        }
    });
}

// ---------------------------------------------------------------------------
// Headline metrics strip
// ---------------------------------------------------------------------------

pub fn headline(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        return;
    };
    let m = &report.headline;

    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Bookings", m.total_bookings.to_string());
        metric(ui, "Passengers", m.total_passengers.to_string());
        metric(
            ui,
            "Average price",
            m.average_price.map_or_else(|| "–".to_string(), |p| format!("${p:.2}")),
        );
        metric(ui, "Routes", m.distinct_routes.to_string());
        metric(
            ui,
            "Avg. lead time",
            m.average_lead_time_days
                .map_or_else(|| "–".to_string(), |d| format!("{d:.1} days")),
        );
    });
    ui.label(RichText::new(state.criteria.describe()).weak());
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(label).small());
            ui.heading(value);
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
            let loaded = state.dataset.is_some();
            if ui.add_enabled(loaded, egui::Button::new("Reload")).clicked() {
                state.reload();
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(loaded, egui::Button::new("Export filtered bookings…"))
                .clicked()
            {
                export_csv_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(loaded, egui::Button::new("Export summary (JSON)…"))
                .clicked()
            {
                export_report_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} bookings loaded, {} match",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open booking data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

fn export_csv_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered bookings")
        .add_filter("CSV", &["csv"])
        .set_file_name("filtered_bookings.csv")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_filtered(&path) {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Export failed: {e:#}"));
        }
    }
}

fn export_report_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export summary")
        .add_filter("JSON", &["json"])
        .set_file_name("booking_summary.json")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_report(&path) {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Export failed: {e:#}"));
        }
    }
}
