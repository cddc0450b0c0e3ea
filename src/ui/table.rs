use eframe::egui::{Align, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{DATE_FORMAT, weekday_name};
use crate::state::AppState;

const HEADERS: [&str; 11] = [
    "Booking", "Route", "Departure", "Booked", "Lead (days)", "Weekday", "Price", "Pax", "Airline",
    "Aircraft", "Class",
];

// ---------------------------------------------------------------------------
// Filtered bookings table (bottom panel)
// ---------------------------------------------------------------------------

pub fn bookings_table(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    if state.visible_indices.is_empty() {
        ui.label("No bookings match the current filters.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(Layout::left_to_right(Align::Center))
        .columns(Column::auto().at_least(60.0), HEADERS.len() - 1)
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in HEADERS {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, state.visible_indices.len(), |mut row| {
                let b = &dataset.bookings[state.visible_indices[row.index()]];
                let cells = [
                    b.booking_id.clone(),
                    b.route.clone(),
                    b.departure_date.format(DATE_FORMAT).to_string(),
                    b.booking_date.format(DATE_FORMAT).to_string(),
                    b.lead_time_days.to_string(),
                    weekday_name(b.booking_weekday).to_string(),
                    format!("${:.2}", b.price),
                    b.passengers.to_string(),
                    b.airline.clone(),
                    b.aircraft_type.clone(),
                    b.class.clone(),
                ];
                for text in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(text);
                    });
                }
            });
        });
}
