use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::aggregate::DashboardReport;
use super::filter::FilteredView;
use super::model::{COLUMNS, DATE_FORMAT};

// ---------------------------------------------------------------------------
// CSV export of a filtered view
// ---------------------------------------------------------------------------

/// Write the view's bookings as CSV with the ten source columns.
/// Derived fields are left out; prices use the shortest text that parses
/// back to the same `f64`, so a reload reproduces every field.
pub fn write_csv<W: Write>(view: &FilteredView<'_>, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(COLUMNS).context("writing CSV header")?;

    for booking in view.iter() {
        let departure = booking.departure_date.format(DATE_FORMAT).to_string();
        let booked = booking.booking_date.format(DATE_FORMAT).to_string();
        let price = booking.price.to_string();
        let passengers = booking.passengers.to_string();
        out.write_record([
            booking.booking_id.as_str(),
            booking.origin.as_str(),
            booking.destination.as_str(),
            departure.as_str(),
            booked.as_str(),
            price.as_str(),
            passengers.as_str(),
            booking.airline.as_str(),
            booking.aircraft_type.as_str(),
            booking.class.as_str(),
        ])
        .with_context(|| format!("writing booking {}", booking.booking_id))?;
    }

    out.flush().context("flushing CSV output")?;
    Ok(())
}

pub fn export_csv(view: &FilteredView<'_>, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(view, BufWriter::new(file))?;
    log::info!("exported {} bookings to {}", view.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON export of the aggregation tables
// ---------------------------------------------------------------------------

pub fn export_report_json(report: &DashboardReport, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).context("serializing report")?;
    writer.flush().context("flushing report")?;
    log::info!("exported summary report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::TrendGranularity;
    use crate::data::filter::{FilterCriteria, filter};
    use crate::data::loader::load_file;
    use crate::data::model::fixtures::{dataset, raw};

    #[test]
    fn export_then_reload_round_trips_every_field() {
        let mut awkward = raw("BK,2", "Alice Springs", "Sydney", "2024-02-29", 0.1 + 0.2);
        awkward.airline = "Rex \"Regional\" Airlines".to_string();
        awkward.class = "Premium Economy".to_string();
        awkward.passengers = "7".to_string();
        let ds = dataset(vec![
            raw("BK1", "Sydney", "Melbourne", "2024-01-05", 129.99),
            awkward,
            raw("BK3", "Perth", "Darwin", "2024-12-31", 1234.5678901234),
        ]);
        let view = filter(&ds, &FilterCriteria::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        export_csv(&view, &path).unwrap();

        let reloaded = load_file(&path).unwrap();
        assert_eq!(reloaded.drop_report.total_dropped(), 0);
        assert_eq!(reloaded.bookings, ds.bookings);
    }

    #[test]
    fn exports_only_the_filtered_rows() {
        let ds = dataset(vec![
            raw("BK1", "Sydney", "Melbourne", "2024-01-05", 100.0),
            raw("BK2", "Perth", "Melbourne", "2024-01-05", 100.0),
        ]);
        let view = filter(
            &ds,
            &FilterCriteria {
                origin: Some("Perth".to_string()),
                ..Default::default()
            },
        );
        let mut buf = Vec::new();
        write_csv(&view, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], COLUMNS.join(","));
        assert!(lines[1].starts_with("BK2,Perth,Melbourne,2024-01-05,2024-01-02,100,1,"));
    }

    #[test]
    fn report_json_contains_all_tables() {
        let ds = dataset(vec![raw("BK1", "Sydney", "Melbourne", "2024-01-05", 100.0)]);
        let view = filter(&ds, &FilterCriteria::default());
        let report = DashboardReport::compute(&view, TrendGranularity::Week);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        export_report_json(&report, &path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["granularity"], "week");
        assert_eq!(json["headline"]["total_bookings"], 1);
        assert_eq!(json["routes"][0]["route"], "Sydney → Melbourne");
        assert_eq!(json["weekday_demand"].as_array().unwrap().len(), 7);
    }
}
