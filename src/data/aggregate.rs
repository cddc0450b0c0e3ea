//! Summary tables computed from a [`FilteredView`].
//!
//! Every function is pure and returns an empty table for an empty view.
//! Mean prices are plain arithmetic means over bookings (sum of prices /
//! number of bookings); passenger counts never weight them.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::filter::FilteredView;
use super::model::{BookingRecord, WEEKDAYS};

// ---------------------------------------------------------------------------
// Running price statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct PriceStats {
    bookings: usize,
    passengers: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for PriceStats {
    fn default() -> Self {
        PriceStats {
            bookings: 0,
            passengers: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl PriceStats {
    fn add(&mut self, booking: &BookingRecord) {
        self.bookings += 1;
        self.passengers += u64::from(booking.passengers);
        self.sum += booking.price;
        self.min = self.min.min(booking.price);
        self.max = self.max.max(booking.price);
    }

    fn mean(&self) -> Option<f64> {
        (self.bookings > 0).then(|| self.sum / self.bookings as f64)
    }
}

// ---------------------------------------------------------------------------
// Route popularity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStat {
    pub route: String,
    pub origin: String,
    pub destination: String,
    pub bookings: usize,
    pub passengers: u64,
    pub mean_price: f64,
}

/// Group by route; most booked first, ties by route name ascending.
pub fn route_popularity(view: &FilteredView<'_>) -> Vec<RouteStat> {
    let mut groups: HashMap<&str, (&BookingRecord, PriceStats)> = HashMap::new();
    for booking in view.iter() {
        groups
            .entry(booking.route.as_str())
            .or_insert_with(|| (booking, PriceStats::default()))
            .1
            .add(booking);
    }

    let mut routes: Vec<RouteStat> = groups
        .into_values()
        .map(|(first, stats)| RouteStat {
            route: first.route.clone(),
            origin: first.origin.clone(),
            destination: first.destination.clone(),
            bookings: stats.bookings,
            passengers: stats.passengers,
            mean_price: stats.mean().unwrap_or_default(),
        })
        .collect();

    routes.sort_by(|a, b| b.bookings.cmp(&a.bookings).then_with(|| a.route.cmp(&b.route)));
    routes
}

// ---------------------------------------------------------------------------
// Price trend
// ---------------------------------------------------------------------------

/// Period used to bucket departure dates in the price trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendGranularity {
    #[default]
    Day,
    /// ISO weeks, labelled by their Monday.
    Week,
}

impl TrendGranularity {
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            TrendGranularity::Day => date,
            TrendGranularity::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendGranularity::Day => "Daily",
            TrendGranularity::Week => "Weekly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub period_start: NaiveDate,
    pub bookings: usize,
    pub mean_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Mean / min / max price per departure period, oldest first.
pub fn price_trend(view: &FilteredView<'_>, granularity: TrendGranularity) -> Vec<PricePoint> {
    let mut periods: BTreeMap<NaiveDate, PriceStats> = BTreeMap::new();
    for booking in view.iter() {
        periods
            .entry(granularity.period_start(booking.departure_date))
            .or_default()
            .add(booking);
    }

    periods
        .into_iter()
        .map(|(period_start, stats)| PricePoint {
            period_start,
            bookings: stats.bookings,
            mean_price: stats.mean().unwrap_or_default(),
            min_price: stats.min,
            max_price: stats.max,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Demand by weekday
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayDemand {
    pub weekday: Weekday,
    pub bookings: usize,
    pub passengers: u64,
    /// `None` when nothing was booked on this weekday.
    pub mean_price: Option<f64>,
}

/// Always seven rows, Monday to Sunday, keyed by booking weekday.
pub fn demand_by_weekday(view: &FilteredView<'_>) -> Vec<WeekdayDemand> {
    let mut days = [PriceStats::default(); 7];
    for booking in view.iter() {
        days[booking.booking_weekday.num_days_from_monday() as usize].add(booking);
    }

    WEEKDAYS
        .iter()
        .zip(days.iter())
        .map(|(&weekday, stats)| WeekdayDemand {
            weekday,
            bookings: stats.bookings,
            passengers: stats.passengers,
            mean_price: stats.mean(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Average price by airline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirlinePrice {
    pub airline: String,
    pub bookings: usize,
    pub mean_price: f64,
}

/// Airlines in name order; bookings without an airline are skipped.
pub fn price_by_airline(view: &FilteredView<'_>) -> Vec<AirlinePrice> {
    let mut airlines: BTreeMap<&str, PriceStats> = BTreeMap::new();
    for booking in view.iter().filter(|b| !b.airline.is_empty()) {
        airlines.entry(booking.airline.as_str()).or_default().add(booking);
    }

    airlines
        .into_iter()
        .map(|(airline, stats)| AirlinePrice {
            airline: airline.to_string(),
            bookings: stats.bookings,
            mean_price: stats.mean().unwrap_or_default(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub total_bookings: usize,
    pub total_passengers: u64,
    pub average_price: Option<f64>,
    pub distinct_routes: usize,
    pub average_lead_time_days: Option<f64>,
}

pub fn headline_metrics(view: &FilteredView<'_>) -> HeadlineMetrics {
    let mut stats = PriceStats::default();
    let mut lead_days: i64 = 0;
    let mut routes = HashSet::new();
    for booking in view.iter() {
        stats.add(booking);
        lead_days += booking.lead_time_days;
        routes.insert(booking.route.as_str());
    }

    HeadlineMetrics {
        total_bookings: stats.bookings,
        total_passengers: stats.passengers,
        average_price: stats.mean(),
        distinct_routes: routes.len(),
        average_lead_time_days: (stats.bookings > 0).then(|| lead_days as f64 / stats.bookings as f64),
    }
}

// ---------------------------------------------------------------------------
// DashboardReport – everything the presentation layer needs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub granularity: TrendGranularity,
    pub headline: HeadlineMetrics,
    pub routes: Vec<RouteStat>,
    pub price_trend: Vec<PricePoint>,
    pub weekday_demand: Vec<WeekdayDemand>,
    pub airline_prices: Vec<AirlinePrice>,
}

impl DashboardReport {
    pub fn compute(view: &FilteredView<'_>, granularity: TrendGranularity) -> Self {
        DashboardReport {
            granularity,
            headline: headline_metrics(view),
            routes: route_popularity(view),
            price_trend: price_trend(view, granularity),
            weekday_demand: demand_by_weekday(view),
            airline_prices: price_by_airline(view),
        }
    }

    /// True when the view behind this report had no rows.
    pub fn is_empty(&self) -> bool {
        self.headline.total_bookings == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterCriteria, filter};
    use crate::data::model::fixtures::{dataset, raw, syd_mel};
    use crate::data::model::{Dataset, RawBooking};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn booked_on(mut row: RawBooking, booking_date: &str) -> RawBooking {
        row.booking_date = booking_date.to_string();
        row
    }

    fn mixed() -> Dataset {
        let mut a = raw("B1", "Sydney", "Melbourne", "2024-03-04", 100.0);
        a.passengers = "3".to_string();
        let mut b = raw("B5", "Perth", "Adelaide", "2024-03-12", 400.0);
        b.airline = "Jetstar".to_string();
        dataset(vec![
            booked_on(a, "2024-03-01"),                                                   // Fri
            booked_on(raw("B2", "Sydney", "Melbourne", "2024-03-05", 200.0), "2024-03-01"), // Fri
            booked_on(raw("B3", "Brisbane", "Perth", "2024-03-05", 300.0), "2024-03-04"),   // Mon
            booked_on(raw("B4", "Adelaide", "Perth", "2024-03-11", 150.0), "2024-03-04"),   // Mon
            booked_on(b, "2024-03-09"),                                                   // Sat
        ])
    }

    #[test]
    fn syd_mel_scenario() {
        let ds = syd_mel();
        let view = filter(
            &ds,
            &FilterCriteria {
                origin: Some("SYD".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(view.len(), 2);
        let routes = route_popularity(&view);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].route, "SYD → MEL");
        assert_eq!(routes[0].bookings, 2);
        assert_eq!(routes[0].mean_price, 130.0);
    }

    #[test]
    fn routes_sorted_by_count_then_name_and_sum_to_total() {
        let ds = mixed();
        let view = filter(&ds, &FilterCriteria::default());
        let routes = route_popularity(&view);
        let names: Vec<&str> = routes.iter().map(|r| r.route.as_str()).collect();
        assert_eq!(
            names,
            ["Sydney → Melbourne", "Adelaide → Perth", "Brisbane → Perth", "Perth → Adelaide"]
        );
        assert_eq!(routes[0].passengers, 4);
        assert_eq!(routes[0].mean_price, 150.0);
        assert_eq!(routes.iter().map(|r| r.bookings).sum::<usize>(), view.len());
    }

    #[test]
    fn daily_trend_is_chronological_with_extrema() {
        let ds = mixed();
        let view = filter(&ds, &FilterCriteria::default());
        let trend = price_trend(&view, TrendGranularity::Day);
        let starts: Vec<NaiveDate> = trend.iter().map(|p| p.period_start).collect();
        assert_eq!(
            starts,
            [date("2024-03-04"), date("2024-03-05"), date("2024-03-11"), date("2024-03-12")]
        );
        assert_eq!(trend[1].bookings, 2);
        assert_eq!(trend[1].mean_price, 250.0);
        assert_eq!(trend[1].min_price, 200.0);
        assert_eq!(trend[1].max_price, 300.0);
    }

    #[test]
    fn weekly_trend_buckets_by_monday() {
        let ds = mixed();
        let view = filter(&ds, &FilterCriteria::default());
        let trend = price_trend(&view, TrendGranularity::Week);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].period_start, date("2024-03-04"));
        assert_eq!(trend[0].bookings, 3);
        assert_eq!(trend[0].mean_price, 200.0);
        assert_eq!(trend[1].period_start, date("2024-03-11"));
        assert_eq!(trend[1].min_price, 150.0);
        assert_eq!(trend[1].max_price, 400.0);
        assert_eq!(TrendGranularity::Week.period_start(date("2024-03-10")), date("2024-03-04"));
    }

    #[test]
    fn weekday_demand_always_has_seven_rows() {
        let ds = mixed();
        let view = filter(&ds, &FilterCriteria::default());
        let demand = demand_by_weekday(&view);
        assert_eq!(demand.len(), 7);
        assert_eq!(demand.iter().map(|d| d.weekday).collect::<Vec<_>>(), WEEKDAYS);
        assert_eq!(demand.iter().map(|d| d.bookings).sum::<usize>(), view.len());

        let monday = &demand[0];
        assert_eq!(monday.bookings, 2);
        assert_eq!(monday.mean_price, Some(225.0));
        assert_eq!(demand[1].bookings, 0);
        assert_eq!(demand[1].mean_price, None);
        assert_eq!(demand[4].passengers, 4);
    }

    #[test]
    fn airline_prices_in_name_order() {
        let ds = mixed();
        let view = filter(&ds, &FilterCriteria::default());
        let airlines = price_by_airline(&view);
        assert_eq!(airlines.len(), 2);
        assert_eq!(airlines[0].airline, "Jetstar");
        assert_eq!(airlines[0].mean_price, 400.0);
        assert_eq!(airlines[1].airline, "Qantas");
        assert_eq!(airlines[1].bookings, 4);
        assert_eq!(airlines[1].mean_price, 187.5);
    }

    #[test]
    fn headline_metrics_summarise_the_view() {
        let ds = syd_mel();
        let view = filter(&ds, &FilterCriteria::default());
        let m = headline_metrics(&view);
        assert_eq!(m.total_bookings, 3);
        assert_eq!(m.total_passengers, 3);
        assert_eq!(m.average_price, Some(350.0 / 3.0));
        assert_eq!(m.distinct_routes, 2);
        assert_eq!(m.average_lead_time_days, Some(3.0));
    }

    #[test]
    fn empty_view_gives_empty_tables() {
        let ds = syd_mel();
        let view = filter(
            &ds,
            &FilterCriteria {
                destination: Some("Hobart".to_string()),
                ..Default::default()
            },
        );
        let report = DashboardReport::compute(&view, TrendGranularity::Day);
        assert!(report.is_empty());
        assert!(report.routes.is_empty());
        assert!(report.price_trend.is_empty());
        assert!(report.airline_prices.is_empty());
        assert_eq!(report.weekday_demand.len(), 7);
        assert!(report.weekday_demand.iter().all(|d| d.bookings == 0));
        assert_eq!(report.headline, HeadlineMetrics::default());
    }
}
