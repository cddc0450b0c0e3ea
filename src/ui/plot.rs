use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::data::aggregate::{DashboardReport, PricePoint};
use crate::data::model::weekday_name;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

/// Render the four charts, or the matching placeholder.
pub fn charts(ui: &mut Ui, state: &AppState) {
    let report = match (&state.dataset, &state.report) {
        (Some(_), Some(report)) => report,
        _ => {
            ui.centered_and_justified(|ui: &mut Ui| {
                if state.status_message.is_some() {
                    ui.heading("Could not load bookings. See the message above.");
                } else {
                    ui.heading("Open a booking file to begin  (File → Open…)");
                }
            });
            return;
        }
    };

    if report.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No bookings match the current filters.");
        });
        return;
    }

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Popular routes");
        route_chart(&mut cols[0], report, state);
        cols[1].strong(format!("{} price trend", report.granularity.label()));
        price_trend_chart(&mut cols[1], report);
    });
    ui.add_space(8.0);
    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Demand by booking weekday");
        weekday_chart(&mut cols[0], report);
        cols[1].strong("Average price by airline");
        airline_chart(&mut cols[1], report, state);
    });
}

/// Axis labels for integer positions `0..labels.len()`; blank elsewhere.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let v = mark.value;
        if v.fract() != 0.0 || v < 0.0 {
            return String::new();
        }
        labels.get(v as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

/// Horizontal bars, most booked route on top, coloured by origin city.
fn route_chart(ui: &mut Ui, report: &DashboardReport, state: &AppState) {
    let top: Vec<_> = report.routes.iter().take(state.settings.top_routes).collect();
    let n = top.len();

    // Position 0 is the bottom of the chart.
    let mut labels = vec![String::new(); n];
    let mut by_origin: BTreeMap<&str, Vec<Bar>> = BTreeMap::new();
    for (rank, route) in top.iter().enumerate() {
        let pos = n - 1 - rank;
        labels[pos] = route.route.clone();
        let bar = Bar::new(pos as f64, route.bookings as f64)
            .name(format!(
                "{}: {} bookings, {} passengers, avg ${:.2}",
                route.route, route.bookings, route.passengers, route.mean_price
            ))
            .width(0.7);
        by_origin.entry(route.origin.as_str()).or_default().push(bar);
    }

    Plot::new("route_popularity")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Bookings")
        .y_axis_formatter(category_formatter(labels))
        .include_x(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (origin, bars) in by_origin {
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .horizontal()
                        .name(format!("from {origin}"))
                        .color(state.origin_colors.color_for(origin)),
                );
            }
        });
}

/// Mean price line with min / max envelope lines.
fn price_trend_chart(ui: &mut Ui, report: &DashboardReport) {
    let x = |d: NaiveDate| f64::from(d.num_days_from_ce());
    let series = |f: fn(&PricePoint) -> f64| -> PlotPoints {
        report
            .price_trend
            .iter()
            .map(|p| [x(p.period_start), f(p)])
            .collect()
    };

    Plot::new("price_trend")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("Price ($)")
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
            NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
                .map(|d| d.format("%d %b").to_string())
                .unwrap_or_default()
        })
        .include_y(0.0)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(series(|p| p.max_price))
                    .name("Max")
                    .color(Color32::from_rgb(220, 90, 90))
                    .width(1.0),
            );
            plot_ui.line(
                Line::new(series(|p| p.min_price))
                    .name("Min")
                    .color(Color32::from_rgb(90, 170, 90))
                    .width(1.0),
            );
            plot_ui.line(
                Line::new(series(|p| p.mean_price))
                    .name("Mean")
                    .color(Color32::LIGHT_BLUE)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(series(|p| p.mean_price))
                    .name("Mean")
                    .color(Color32::LIGHT_BLUE)
                    .radius(2.5),
            );
        });
}

/// One bar per weekday, Monday first; empty weekdays show as zero.
fn weekday_chart(ui: &mut Ui, report: &DashboardReport) {
    let labels: Vec<String> = report
        .weekday_demand
        .iter()
        .map(|d| weekday_name(d.weekday)[..3].to_string())
        .collect();

    let bars: Vec<Bar> = report
        .weekday_demand
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let avg = d
                .mean_price
                .map_or_else(|| "no bookings".to_string(), |p| format!("avg ${p:.2}"));
            Bar::new(i as f64, d.bookings as f64)
                .name(format!("{}: {} bookings, {avg}", weekday_name(d.weekday), d.bookings))
                .width(0.7)
        })
        .collect();

    Plot::new("weekday_demand")
        .height(CHART_HEIGHT)
        .y_axis_label("Bookings")
        .x_axis_formatter(category_formatter(labels))
        .include_x(-0.5)
        .include_x(6.5)
        .include_y(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::from_rgb(100, 150, 230)));
        });
}

fn airline_chart(ui: &mut Ui, report: &DashboardReport, state: &AppState) {
    let labels: Vec<String> = report.airline_prices.iter().map(|a| a.airline.clone()).collect();

    Plot::new("airline_prices")
        .height(CHART_HEIGHT)
        .y_axis_label("Average price ($)")
        .x_axis_formatter(category_formatter(labels))
        .include_y(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, airline) in report.airline_prices.iter().enumerate() {
                let bar = Bar::new(i as f64, airline.mean_price)
                    .name(format!(
                        "{}: avg ${:.2} over {} bookings",
                        airline.airline, airline.mean_price, airline.bookings
                    ))
                    .width(0.6);
                plot_ui.bar_chart(
                    BarChart::new(vec![bar]).color(state.airline_colors.color_for(&airline.airline)),
                );
            }
        });
}
