//! Writes a synthetic booking table as `sample_bookings.csv` and
//! `sample_bookings.parquet`.
//!
//! Usage: `generate_sample [ROWS]` (default 500). A few deliberately invalid
//! rows are mixed into the CSV so the dashboard's row validation has
//! something to report.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use parquet::arrow::ArrowWriter;

const CITIES: [(&str, f64, f64); 5] = [
    // name, latitude, longitude
    ("Sydney", -33.87, 151.21),
    ("Melbourne", -37.81, 144.96),
    ("Brisbane", -27.47, 153.03),
    ("Perth", -31.95, 115.86),
    ("Adelaide", -34.93, 138.60),
];
const AIRLINES: [&str; 4] = ["Qantas", "Virgin Australia", "Jetstar", "Rex Airlines"];
const AIRCRAFT: [&str; 5] = ["A320", "A321neo", "B737-800", "B787-9", "Q400"];
const CLASSES: [(&str, f64); 3] = [("Economy", 1.0), ("Premium Economy", 1.6), ("Business", 3.2)];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }
}

struct Booking {
    id: String,
    origin: &'static str,
    destination: &'static str,
    departure: NaiveDate,
    booked: NaiveDate,
    price: f64,
    passengers: i64,
    airline: &'static str,
    aircraft: &'static str,
    class: &'static str,
}

/// Rough great-circle distance in km, used to scale fares.
fn distance_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let h = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
    2.0 * 6371.0 * h.sqrt().asin()
}

fn generate_booking(i: usize, first_departure: NaiveDate, rng: &mut SimpleRng) -> Booking {
    let o = rng.below(CITIES.len());
    let d = (o + 1 + rng.below(CITIES.len() - 1)) % CITIES.len();
    let (origin, olat, olon) = CITIES[o];
    let (destination, dlat, dlon) = CITIES[d];

    let departure = first_departure + Duration::days(rng.below(90) as i64);
    let lead = rng.below(60) as i64;
    let booked = departure - Duration::days(lead);

    let (class, class_factor) = if rng.next_f64() < 0.75 {
        CLASSES[0]
    } else {
        *rng.pick(&CLASSES[1..])
    };

    // Short-notice and weekend departures cost more.
    let base = 60.0 + distance_km((olat, olon), (dlat, dlon)) * 0.09;
    let urgency = 1.0 + (60 - lead) as f64 / 120.0;
    let weekend = match departure.weekday() {
        Weekday::Fri | Weekday::Sat | Weekday::Sun => 1.15,
        _ => 1.0,
    };
    let noise = 0.85 + rng.next_f64() * 0.3;
    let price = (base * class_factor * urgency * weekend * noise * 100.0).round() / 100.0;

    Booking {
        id: format!("BK{:05}", i + 1),
        origin,
        destination,
        departure,
        booked,
        price,
        passengers: 1 + rng.below(4) as i64,
        airline: *rng.pick(&AIRLINES),
        aircraft: *rng.pick(&AIRCRAFT),
        class,
    }
}

fn write_csv(path: &str, bookings: &[Booking], rng: &mut SimpleRng) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
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
    ])?;

    let mut invalid = 0;
    for b in bookings {
        let mut booked = b.booked.format("%Y-%m-%d").to_string();
        let mut price = b.price.to_string();
        // Roughly 2% of rows get a defect the loader should reject.
        if rng.next_f64() < 0.02 {
            invalid += 1;
            if rng.next_f64() < 0.5 {
                booked = (b.departure + Duration::days(3)).format("%Y-%m-%d").to_string();
            } else {
                price = "0".to_string();
            }
        }
        writer.write_record([
            b.id.as_str(),
            b.origin,
            b.destination,
            b.departure.format("%Y-%m-%d").to_string().as_str(),
            booked.as_str(),
            price.as_str(),
            b.passengers.to_string().as_str(),
            b.airline,
            b.aircraft,
            b.class,
        ])?;
    }
    writer.flush()?;
    Ok(invalid)
}

fn write_parquet(path: &str, bookings: &[Booking]) -> Result<RecordBatch> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch date")?;
    let days = |d: NaiveDate| (d - epoch).num_days() as i32;
    let strings = |f: fn(&Booking) -> &str| {
        StringArray::from(bookings.iter().map(f).collect::<Vec<_>>())
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("booking_id", DataType::Utf8, false),
        Field::new("origin", DataType::Utf8, false),
        Field::new("destination", DataType::Utf8, false),
        Field::new("departure_date", DataType::Date32, false),
        Field::new("booking_date", DataType::Date32, false),
        Field::new("price", DataType::Float64, false),
        Field::new("passengers", DataType::Int64, false),
        Field::new("airline", DataType::Utf8, false),
        Field::new("aircraft_type", DataType::Utf8, false),
        Field::new("class", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(strings(|b| b.id.as_str())),
            Arc::new(strings(|b| b.origin)),
            Arc::new(strings(|b| b.destination)),
            Arc::new(Date32Array::from(
                bookings.iter().map(|b| days(b.departure)).collect::<Vec<_>>(),
            )),
            Arc::new(Date32Array::from(
                bookings.iter().map(|b| days(b.booked)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                bookings.iter().map(|b| b.price).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                bookings.iter().map(|b| b.passengers).collect::<Vec<_>>(),
            )),
            Arc::new(strings(|b| b.airline)),
            Arc::new(strings(|b| b.aircraft)),
            Arc::new(strings(|b| b.class)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(batch)
}

fn main() -> Result<()> {
    env_logger::init();

    let rows: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse().with_context(|| format!("invalid row count: {arg}"))?,
        None => 500,
    };

    let mut rng = SimpleRng::new(42);
    let first_departure = NaiveDate::from_ymd_opt(2024, 1, 1).context("start date")?;
    let bookings: Vec<Booking> = (0..rows)
        .map(|i| generate_booking(i, first_departure, &mut rng))
        .collect();

    let csv_path = "sample_bookings.csv";
    let invalid = write_csv(csv_path, &bookings, &mut rng)?;
    println!("Wrote {rows} bookings ({invalid} deliberately invalid) to {csv_path}");

    let parquet_path = "sample_bookings.parquet";
    let batch = write_parquet(parquet_path, &bookings)?;
    println!("Wrote {rows} bookings to {parquet_path}");

    let preview = batch.slice(0, batch.num_rows().min(5));
    log::info!("preview:\n{}", pretty_format_batches(&[preview])?);

    Ok(())
}
