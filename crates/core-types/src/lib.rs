//! # Core Types
//!
//! The shared vocabulary of the heatmap workspace: the daily [`TimeSeriesTable`],
//! the `(year, month)` [`YearMonth`] bucket, [`PeriodSeries`] for anything keyed by
//! bucket, the [`HeatmapMatrix`] output shape and the [`ForwardPeriod`] token.
//!
//! This is a Layer 0 crate. It holds data and validation only, no statistics.

pub mod enums;
pub mod error;
pub mod structs;
pub mod table;

// Re-export the core types to provide a clean public API.
pub use enums::ForwardPeriod;
pub use error::CoreError;
pub use structs::{HeatmapMatrix, MonthlySeries, PeriodSeries, RankSeries, ReturnSeries, YearMonth};
pub use table::TimeSeriesTable;
