use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{COLUMNS, Dataset, DatasetBuilder, DropReason, RawBooking};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// File-level failures. Row-level problems never surface here; they are
/// counted in the dataset's `DropReport` instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("{} is missing required column(s): {}", .path.display(), .missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error("unsupported file extension: .{0} (expected csv, json or parquet)")]
    UnsupportedFormat(String),

    #[error("{0}")]
    InvalidLayout(String),

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("decoding Arrow data: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a booking dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the ten booking columns (any order)
/// * `.json`    – `[{ "booking_id": "...", "origin": "...", ... }, ...]`
/// * `.parquet` – one column per booking field; dates as Utf8 or Date32
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "loaded {} bookings from {} ({} dropped)",
        dataset.len(),
        path.display(),
        dataset.drop_report.total_dropped()
    );
    Ok(dataset.with_source(path))
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Map every required column to its position in `headers`.
/// Names are trimmed (and a UTF-8 BOM removed) but otherwise case-sensitive.
fn resolve_columns<'a>(
    path: &Path,
    headers: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<(usize, &'static str)>, LoadError> {
    let names: Vec<&str> = headers
        .into_iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();

    let mut found = Vec::with_capacity(COLUMNS.len());
    let mut missing = Vec::new();
    for column in COLUMNS {
        match names.iter().position(|n| *n == column) {
            Some(idx) => found.push((idx, column)),
            None => missing.push(column.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(found)
    } else {
        Err(LoadError::Schema {
            path: path.to_path_buf(),
            missing,
        })
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(open(path)?);
    let headers = reader.headers()?.clone();
    let columns = resolve_columns(path, headers.iter())?;

    let mut builder = DatasetBuilder::new();

    for (row_no, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = row_no + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(LoadError::Csv(e)),
            Err(e) => {
                log::debug!("row {line}: {e}");
                builder.reject(line, DropReason::MalformedRow);
                continue;
            }
        };

        let mut raw = RawBooking::default();
        let mut complete = true;
        for &(idx, column) in &columns {
            match (record.get(idx), raw.field_mut(column)) {
                (Some(value), Some(slot)) => *slot = value.to_string(),
                _ => complete = false,
            }
        }

        if complete {
            builder.push(line, raw);
        } else {
            builder.reject(line, DropReason::MalformedRow);
        }
    }

    Ok(builder.finish())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "booking_id": "BK0001", "origin": "Sydney", "price": 129.5, ... },
///   ...
/// ]
/// ```
///
/// The schema is checked against the first record.
fn load_json(path: &Path) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::InvalidLayout("expected a top-level JSON array".to_string()))?;

    if let Some(first) = records.first() {
        let keys = first
            .as_object()
            .ok_or_else(|| LoadError::InvalidLayout("record 0 is not a JSON object".to_string()))?
            .keys()
            .map(String::as_str);
        resolve_columns(path, keys)?;
    }

    let mut builder = DatasetBuilder::new();

    for (i, rec) in records.iter().enumerate() {
        let line = i + 1;
        let Some(obj) = rec.as_object() else {
            builder.reject(line, DropReason::MalformedRow);
            continue;
        };

        let mut raw = RawBooking::default();
        let mut complete = true;
        for column in COLUMNS {
            match (obj.get(column), raw.field_mut(column)) {
                (Some(value), Some(slot)) => *slot = json_to_text(value),
                _ => complete = false,
            }
        }

        if complete {
            builder.push(line, raw);
        } else {
            builder.reject(line, DropReason::MalformedRow);
        }
    }

    Ok(builder.finish())
}

fn json_to_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas, Polars or `generate_sample`.
/// Cells are rendered to text with Arrow's display formatter and then go
/// through the same validation as CSV rows. Date columns stored as
/// `Timestamp` or `Date64` (Pandas' `datetime64`) are cast to `Date32`
/// first so they render as plain `YYYY-MM-DD`.
fn load_parquet(path: &Path) -> Result<Dataset, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let arrow_schema = builder.schema().clone();
    let field_names = arrow_schema.fields().iter().map(|f| f.name().as_str());
    let columns = resolve_columns(path, field_names)?;
    let reader = builder.build()?;

    let mut dataset = DatasetBuilder::new();
    let mut line = 0;

    for batch_result in reader {
        let batch = batch_result?;
        let arrays = columns
            .iter()
            .map(|&(idx, column)| date_as_date32(column, batch.column(idx)))
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            line += 1;
            let mut raw = RawBooking::default();
            for (array, &(_, column)) in arrays.iter().zip(&columns) {
                let text = if array.is_null(row) {
                    String::new()
                } else {
                    array_value_to_string(array, row)?
                };
                if let Some(slot) = raw.field_mut(column) {
                    *slot = text;
                }
            }
            dataset.push(line, raw);
        }
    }

    Ok(dataset.finish())
}

/// Timestamps keep their time of day when displayed; date columns only
/// want the calendar day.
fn date_as_date32(column: &str, array: &ArrayRef) -> Result<ArrayRef, LoadError> {
    let is_date_column = matches!(column, "departure_date" | "booking_date");
    match array.data_type() {
        DataType::Timestamp(_, _) | DataType::Date64 if is_date_column => {
            Ok(cast(array, &DataType::Date32)?)
        }
        _ => Ok(array.clone()),
    }
}
