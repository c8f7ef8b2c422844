//! # Heatmap Analytics Engine
//!
//! This crate computes the derived statistics behind the index heatmaps: monthly
//! averages, month-over-month and forward returns, and the cross-sectional rank and
//! percentile metrics that compare one index against every other index in the table.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of files or
//!   HTTP. It depends only on `core-types` (Layer 0).
//! - **Absence is explicit:** every value that cannot be computed is `None`, never a
//!   zero or a sentinel, from the monthly buckets all the way to the output matrices.
//! - **One service per dataset:** `HeatmapService` owns the loaded table and a
//!   `ResultCache`. Building a new service is the only way to invalidate the cache.
//!
//! ## Public API
//!
//! - `HeatmapService`: the named operations over one loaded table.
//! - `HeatmapReport`: the bundle of every metric for one index.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.
//! - `aggregator`, `returns`, `ranking`, `matrix`: the pure building blocks.

// Declare the modules that constitute this crate.
pub mod aggregator;
pub mod cache;
pub mod error;
pub mod matrix;
pub mod ranking;
pub mod report;
pub mod returns;
pub mod service;

// Re-export the key components to create a clean, public-facing API.
pub use cache::{CacheKey, CacheStats, Operation, ResultCache};
pub use error::AnalyticsError;
pub use report::HeatmapReport;
pub use service::HeatmapService;
