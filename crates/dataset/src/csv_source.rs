use crate::error::DatasetError;
use chrono::{NaiveDate, NaiveDateTime};
use core_types::TimeSeriesTable;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_DATE_COLUMN: &str = "DATE";

/// Accepted date layouts, tried in order. Day-first wins over month-first when a
/// slash-separated date is valid in both.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Cell contents that mean "no observation". Compared case-insensitively.
const ABSENCE_MARKERS: [&str; 6] = ["", "NA", "N/A", "NaN", "null", "-"];

/// A daily index CSV: one date column plus one numeric column per index.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    date_column: String,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, date_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            date_column: date_column.into(),
        }
    }

    /// Reads and validates the whole file.
    pub fn load(&self) -> Result<TimeSeriesTable, DatasetError> {
        let origin = self.path.display().to_string();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|source| DatasetError::Csv {
                origin: origin.clone(),
                source,
            })?;

        let table = parse(reader, &self.date_column, &origin)?;
        info!(
            path = %origin,
            rows = table.row_count(),
            indices = table.index_count(),
            "CSV data loaded."
        );
        Ok(table)
    }
}

/// Parses CSV text from any reader. Rows may come in any date order; they are
/// sorted, and a repeated date is an error.
pub fn read_table<R: io::Read>(
    reader: R,
    date_column: &str,
) -> Result<TimeSeriesTable, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    parse(reader, date_column, "reader")
}

fn parse<R: io::Read>(
    mut reader: csv::Reader<R>,
    date_column: &str,
    origin: &str,
) -> Result<TimeSeriesTable, DatasetError> {
    let csv_error = |source| DatasetError::Csv {
        origin: origin.to_string(),
        source,
    };

    let headers = reader.headers().map_err(csv_error)?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h == date_column)
        .ok_or_else(|| DatasetError::MissingDateColumn(date_column.to_string()))?;

    // (field position, column name) for every index column.
    let mut index_columns: Vec<(usize, String)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if idx == date_idx {
            continue;
        }
        if name.is_empty() {
            warn!(position = idx, "Skipping CSV column without a header.");
            continue;
        }
        index_columns.push((idx, name.to_string()));
    }
    if index_columns.is_empty() {
        return Err(DatasetError::NoIndexColumns);
    }

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        // Header is line 1.
        let line = row_idx + 2;

        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| DatasetError::InvalidDate {
            line,
            value: raw_date.to_string(),
        })?;

        let values = index_columns
            .iter()
            .map(|(idx, name)| {
                let raw = record.get(*idx).unwrap_or_default();
                parse_value(raw).ok_or_else(|| DatasetError::InvalidValue {
                    line,
                    column: name.clone(),
                    value: raw.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        rows.push((date, values));
    }

    rows.sort_by_key(|(date, _)| *date);
    if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(DatasetError::DuplicateDate(pair[0].0.to_string()));
    }

    let dates = rows.iter().map(|(date, _)| *date).collect();
    let columns = index_columns
        .into_iter()
        .enumerate()
        .map(|(col, (_, name))| {
            let values = rows.iter().map(|(_, values)| values[col]).collect();
            (name, values)
        })
        .collect();

    Ok(TimeSeriesTable::new(dates, columns)?)
}

/// Parses a date cell in any of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a numeric cell. `Some(None)` is an absence marker, `None` is garbage.
pub fn parse_value(raw: &str) -> Option<Option<f64>> {
    if ABSENCE_MARKERS.iter().any(|m| m.eq_ignore_ascii_case(raw)) {
        return Some(None);
    }
    let cleaned = raw.replace(',', "");
    let value: f64 = cleaned.parse().ok()?;
    Some(value.is_finite().then_some(value))
}
