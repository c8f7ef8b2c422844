//! # Dataset Crate
//!
//! Turns the daily index CSV into a validated `TimeSeriesTable`. This is the only
//! place that knows about files; everything downstream works on the table.
//!
//! ## Public API
//!
//! - `CsvSource`: a CSV file plus the name of its date column, loaded with `load()`.
//! - `read_table`: the same parsing over any `io::Read`.
//! - `DatasetError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod csv_source;
pub mod error;

// Re-export the key components to create a clean, public-facing API.
pub use csv_source::{CsvSource, DEFAULT_DATE_COLUMN, read_table};
pub use error::DatasetError;
