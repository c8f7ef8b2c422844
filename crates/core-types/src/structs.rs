use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A `(year, month)` aggregation bucket. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date<D: Datelike>(date: &D) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// A chronologically ordered series of bucket values, where `None` marks a bucket
/// whose value could not be computed.
///
/// Keys are unique and strictly increasing. Series are built once and never
/// mutated afterwards; derived series are produced with [`PeriodSeries::map`] or by
/// constructing a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSeries<T> {
    points: Vec<(YearMonth, Option<T>)>,
}

/// Averaged daily values per bucket.
pub type MonthlySeries = PeriodSeries<f64>;
/// Fractional returns per bucket (0.1 is +10%).
pub type ReturnSeries = PeriodSeries<f64>;
/// Cross-sectional rank positions per bucket, 1 being the best.
pub type RankSeries = PeriodSeries<u32>;

impl<T: Copy> PeriodSeries<T> {
    /// Builds a series from unordered points. When a bucket appears twice the first
    /// occurrence is kept.
    pub fn new(mut points: Vec<(YearMonth, Option<T>)>) -> Self {
        points.sort_by_key(|(bucket, _)| *bucket);
        points.dedup_by_key(|(bucket, _)| *bucket);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, Option<T>)> + '_ {
        self.points.iter().copied()
    }

    pub fn buckets(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.points.iter().map(|(bucket, _)| *bucket)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<T>> + '_ {
        self.points.iter().map(|(_, value)| *value)
    }

    /// Value at `bucket`. Returns `None` both when the bucket is absent from the
    /// series and when its value is absent.
    pub fn get(&self, bucket: &YearMonth) -> Option<T> {
        self.points
            .binary_search_by_key(bucket, |(b, _)| *b)
            .ok()
            .and_then(|idx| self.points[idx].1)
    }

    pub fn first_bucket(&self) -> Option<YearMonth> {
        self.points.first().map(|(bucket, _)| *bucket)
    }

    pub fn last_bucket(&self) -> Option<YearMonth> {
        self.points.last().map(|(bucket, _)| *bucket)
    }

    /// Applies `f` to every present value, keeping absence as is.
    pub fn map<U: Copy, F: Fn(T) -> U>(&self, f: F) -> PeriodSeries<U> {
        PeriodSeries {
            points: self
                .points
                .iter()
                .map(|(bucket, value)| (*bucket, value.map(&f)))
                .collect(),
        }
    }
}

impl<T> Default for PeriodSeries<T> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<T: Copy> FromIterator<(YearMonth, Option<T>)> for PeriodSeries<T> {
    fn from_iter<I: IntoIterator<Item = (YearMonth, Option<T>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The universal year -> month -> value output shape.
///
/// Serializes as a JSON object keyed by year, each holding an object keyed by
/// month, both as strings in ascending numeric order: `{"2024": {"1": 0.01, "2": null}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeatmapMatrix<T> {
    rows: BTreeMap<i32, BTreeMap<u32, Option<T>>>,
}

impl<T> HeatmapMatrix<T> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, bucket: YearMonth, value: Option<T>) {
        self.rows
            .entry(bucket.year)
            .or_default()
            .insert(bucket.month, value);
    }

    /// `Some(&None)` is a present cell with an absent value; `None` is no cell at all.
    pub fn get(&self, year: i32, month: u32) -> Option<&Option<T>> {
        self.rows.get(&year).and_then(|months| months.get(&month))
    }

    pub fn rows(&self) -> &BTreeMap<i32, BTreeMap<u32, Option<T>>> {
        &self.rows
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.keys().copied()
    }

    /// Number of cells across all years.
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T> Default for HeatmapMatrix<T> {
    fn default() -> Self {
        Self::new()
    }
}
