use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// The daily observation table: one row per calendar date, one column per index.
///
/// Dates are strictly increasing and every column has exactly one value per date.
/// A `None` value is an explicit absence and is never read as zero. The table is
/// immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
    lookup: HashMap<String, usize>,
}

impl TimeSeriesTable {
    /// Validates and builds a table. Columns keep the order they are given in.
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, CoreError> {
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(CoreError::UnorderedDates {
                previous: pair[0].to_string(),
                next: pair[1].to_string(),
            });
        }

        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        let mut lookup = HashMap::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != dates.len() {
                return Err(CoreError::LengthMismatch {
                    column: name,
                    expected: dates.len(),
                    actual: column.len(),
                });
            }
            if lookup.contains_key(&name) {
                return Err(CoreError::DuplicateColumn(name));
            }
            // Non-finite readings carry no information; store them as absence.
            let column = column
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect();
            lookup.insert(name.clone(), names.len());
            names.push(name);
            values.push(column);
        }

        Ok(Self {
            dates,
            names,
            columns: values,
            lookup,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Index names in column order.
    pub fn index_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, index_name: &str) -> Option<&[Option<f64>]> {
        self.lookup
            .get(index_name)
            .map(|&idx| self.columns[idx].as_slice())
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn index_count(&self) -> usize {
        self.names.len()
    }

    /// The year of the last date in the table.
    pub fn latest_year(&self) -> Option<i32> {
        self.dates.last().map(|d| d.year())
    }
}
