use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

/// Joins origin and destination in the `route` grouping key.
pub const ROUTE_SEPARATOR: &str = " → ";

/// Date layout used for both parsing and export.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source columns in canonical (export) order.
pub const COLUMNS: [&str; 10] = [
    "booking_id",
    "origin",
    "destination",
    "departure_date",
    "booking_date",
    "price",
    "passengers",
    "airline",
    "aircraft_type",
    "class",
];

/// Monday-first week, the axis order of the weekday chart.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn route_label(origin: &str, destination: &str) -> String {
    format!("{origin}{ROUTE_SEPARATOR}{destination}")
}

// ---------------------------------------------------------------------------
// RawBooking – one unvalidated row as read from the file
// ---------------------------------------------------------------------------

/// Every cell kept as text so CSV, JSON and Parquet rows share one validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBooking {
    pub booking_id: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub booking_date: String,
    pub price: String,
    pub passengers: String,
    pub airline: String,
    pub aircraft_type: String,
    pub class: String,
}

impl RawBooking {
    /// Mutable slot for a canonical column name.
    pub fn field_mut(&mut self, column: &str) -> Option<&mut String> {
        let slot = match column {
            "booking_id" => &mut self.booking_id,
            "origin" => &mut self.origin,
            "destination" => &mut self.destination,
            "departure_date" => &mut self.departure_date,
            "booking_date" => &mut self.booking_date,
            "price" => &mut self.price,
            "passengers" => &mut self.passengers,
            "airline" => &mut self.airline,
            "aircraft_type" => &mut self.aircraft_type,
            "class" => &mut self.class,
            _ => return None,
        };
        Some(slot)
    }
}

// ---------------------------------------------------------------------------
// DropReason / DropReport – rows excluded by validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DropReason {
    MalformedRow,
    MissingId,
    DuplicateId,
    MissingCity,
    SameOriginDestination,
    InvalidDate,
    BookedAfterDeparture,
    InvalidPrice,
    InvalidPassengers,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropReason::MalformedRow => "malformed row",
            DropReason::MissingId => "missing booking id",
            DropReason::DuplicateId => "duplicate booking id",
            DropReason::MissingCity => "missing origin or destination",
            DropReason::SameOriginDestination => "origin equals destination",
            DropReason::InvalidDate => "unparsable date",
            DropReason::BookedAfterDeparture => "booking date after departure",
            DropReason::InvalidPrice => "non-positive price",
            DropReason::InvalidPassengers => "non-positive passengers",
        };
        f.write_str(text)
    }
}

/// How many rows were read and why some of them were left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DropReport {
    pub rows_read: usize,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl DropReport {
    pub fn record(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_default() += 1;
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn count(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// BookingRecord – one validated reservation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub booking_date: NaiveDate,
    pub price: f64,
    pub passengers: u32,
    pub airline: String,
    pub aircraft_type: String,
    pub class: String,

    // Derived once at load time.
    pub route: String,
    pub lead_time_days: i64,
    pub booking_weekday: Weekday,
}

impl BookingRecord {
    /// Validate a raw row and compute the derived fields.
    pub fn from_raw(raw: RawBooking) -> Result<Self, DropReason> {
        let booking_id = raw.booking_id.trim().to_string();
        if booking_id.is_empty() {
            return Err(DropReason::MissingId);
        }

        let origin = raw.origin.trim().to_string();
        let destination = raw.destination.trim().to_string();
        if origin.is_empty() || destination.is_empty() {
            return Err(DropReason::MissingCity);
        }
        if origin == destination {
            return Err(DropReason::SameOriginDestination);
        }

        let departure_date = parse_date(&raw.departure_date).ok_or(DropReason::InvalidDate)?;
        let booking_date = parse_date(&raw.booking_date).ok_or(DropReason::InvalidDate)?;
        if booking_date > departure_date {
            return Err(DropReason::BookedAfterDeparture);
        }

        let price = raw
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or(DropReason::InvalidPrice)?;

        let passengers = raw
            .passengers
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(DropReason::InvalidPassengers)?;

        Ok(BookingRecord {
            route: route_label(&origin, &destination),
            lead_time_days: (departure_date - booking_date).num_days(),
            booking_weekday: booking_date.weekday(),
            booking_id,
            origin,
            destination,
            departure_date,
            booking_date,
            price,
            passengers,
            airline: raw.airline.trim().to_string(),
            aircraft_type: raw.aircraft_type.trim().to_string(),
            class: raw.class.trim().to_string(),
        })
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// All valid bookings with pre-computed column indices.
/// Immutable once built; shared behind an `Arc` by the cache.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub bookings: Vec<BookingRecord>,
    /// Sorted distinct values for the filter combo boxes.
    pub origins: BTreeSet<String>,
    pub destinations: BTreeSet<String>,
    pub airlines: BTreeSet<String>,
    /// Earliest and latest departure date.
    pub departure_range: Option<(NaiveDate, NaiveDate)>,
    pub drop_report: DropReport,
    pub source: Option<PathBuf>,
}

impl Dataset {
    /// Build column indices from already-validated bookings.
    pub fn from_bookings(bookings: Vec<BookingRecord>, drop_report: DropReport) -> Self {
        let mut origins = BTreeSet::new();
        let mut destinations = BTreeSet::new();
        let mut airlines = BTreeSet::new();
        let mut departure_range: Option<(NaiveDate, NaiveDate)> = None;

        for b in &bookings {
            origins.insert(b.origin.clone());
            destinations.insert(b.destination.clone());
            if !b.airline.is_empty() {
                airlines.insert(b.airline.clone());
            }
            departure_range = Some(match departure_range {
                None => (b.departure_date, b.departure_date),
                Some((lo, hi)) => (lo.min(b.departure_date), hi.max(b.departure_date)),
            });
        }

        Dataset {
            bookings,
            origins,
            destinations,
            airlines,
            departure_range,
            drop_report,
            source: None,
        }
    }

    pub fn with_source(mut self, path: &Path) -> Self {
        self.source = Some(path.to_path_buf());
        self
    }

    /// Number of bookings.
    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DatasetBuilder – validation + de-duplication while reading
// ---------------------------------------------------------------------------

/// Accumulates rows from any loader; bad rows are counted, never fatal.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    bookings: Vec<BookingRecord>,
    seen_ids: HashSet<String>,
    report: DropReport,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and keep `raw`; `line` is only used for diagnostics.
    pub fn push(&mut self, line: usize, raw: RawBooking) {
        self.report.rows_read += 1;
        match BookingRecord::from_raw(raw) {
            Ok(record) => {
                if self.seen_ids.insert(record.booking_id.clone()) {
                    self.bookings.push(record);
                } else {
                    log::debug!("row {line}: dropped ({}, id {})", DropReason::DuplicateId, record.booking_id);
                    self.report.record(DropReason::DuplicateId);
                }
            }
            Err(reason) => {
                log::debug!("row {line}: dropped ({reason})");
                self.report.record(reason);
            }
        }
    }

    /// Count a row the reader could not even split into fields.
    pub fn reject(&mut self, line: usize, reason: DropReason) {
        self.report.rows_read += 1;
        log::debug!("row {line}: dropped ({reason})");
        self.report.record(reason);
    }

    pub fn finish(self) -> Dataset {
        let dropped = self.report.total_dropped();
        if dropped > 0 {
            log::warn!(
                "dropped {dropped} of {} rows: {:?}",
                self.report.rows_read,
                self.report.dropped
            );
        }
        Dataset::from_bookings(self.bookings, self.report)
    }
}

// ---------------------------------------------------------------------------
// Test fixtures shared by the data-layer tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A valid raw row booked three days before departure.
    pub fn raw(id: &str, origin: &str, destination: &str, departure: &str, price: f64) -> RawBooking {
        let dep = NaiveDate::parse_from_str(departure, DATE_FORMAT).expect("fixture date");
        RawBooking {
            booking_id: id.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date: departure.to_string(),
            booking_date: (dep - chrono::Duration::days(3)).format(DATE_FORMAT).to_string(),
            price: price.to_string(),
            passengers: "1".to_string(),
            airline: "Qantas".to_string(),
            aircraft_type: "A320".to_string(),
            class: "Economy".to_string(),
        }
    }

    pub fn dataset(rows: Vec<RawBooking>) -> Dataset {
        let mut builder = DatasetBuilder::new();
        for (i, row) in rows.into_iter().enumerate() {
            builder.push(i + 1, row);
        }
        builder.finish()
    }

    /// SYD→MEL ×2 and MEL→BNE ×1.
    pub fn syd_mel() -> Dataset {
        dataset(vec![
            raw("B1", "SYD", "MEL", "2024-01-05", 120.0),
            raw("B2", "SYD", "MEL", "2024-01-06", 140.0),
            raw("B3", "MEL", "BNE", "2024-01-05", 90.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn derives_route_lead_time_and_weekday() {
        let mut row = raw("B1", "SYD", "MEL", "2024-01-05", 120.0);
        row.booking_date = "2024-01-01".to_string();
        let rec = BookingRecord::from_raw(row).unwrap();
        assert_eq!(rec.route, "SYD → MEL");
        assert_eq!(rec.lead_time_days, 4);
        assert_eq!(rec.booking_weekday, Weekday::Mon);
    }

    #[test]
    fn rejects_rows_violating_invariants() {
        let mut same = raw("B1", "SYD", "SYD", "2024-01-05", 120.0);
        assert_eq!(BookingRecord::from_raw(same.clone()), Err(DropReason::SameOriginDestination));

        same.destination = "MEL".to_string();
        same.booking_date = "2024-01-06".to_string();
        assert_eq!(BookingRecord::from_raw(same.clone()), Err(DropReason::BookedAfterDeparture));

        same.booking_date = "not a date".to_string();
        assert_eq!(BookingRecord::from_raw(same.clone()), Err(DropReason::InvalidDate));

        let mut priced = raw("B2", "SYD", "MEL", "2024-01-05", 0.0);
        assert_eq!(BookingRecord::from_raw(priced.clone()), Err(DropReason::InvalidPrice));
        priced.price = "99.5".to_string();
        priced.passengers = "0".to_string();
        assert_eq!(BookingRecord::from_raw(priced), Err(DropReason::InvalidPassengers));
    }

    #[test]
    fn builder_drops_duplicates_and_counts_reasons() {
        let mut late = raw("B3", "SYD", "MEL", "2024-01-05", 80.0);
        late.booking_date = "2024-02-01".to_string();
        let ds = dataset(vec![
            raw("B1", "SYD", "MEL", "2024-01-05", 120.0),
            raw("B1", "SYD", "MEL", "2024-01-06", 140.0),
            late,
        ]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.drop_report.rows_read, 3);
        assert_eq!(ds.drop_report.count(DropReason::DuplicateId), 1);
        assert_eq!(ds.drop_report.count(DropReason::BookedAfterDeparture), 1);
        assert_eq!(ds.drop_report.total_dropped(), 2);
    }

    #[test]
    fn builds_column_indices() {
        let ds = syd_mel();
        assert_eq!(ds.origins.iter().collect::<Vec<_>>(), ["MEL", "SYD"]);
        assert_eq!(ds.destinations.iter().collect::<Vec<_>>(), ["BNE", "MEL"]);
        let lo = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let hi = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert_eq!(ds.departure_range, Some((lo, hi)));
    }
}
