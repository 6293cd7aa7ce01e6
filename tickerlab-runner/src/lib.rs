//! TickerLab Runner: batch orchestration around `tickerlab-core`.
//!
//! This crate builds on `tickerlab-core` to provide:
//! - Parallel per-partition computation on a private rayon pool
//! - Fingerprint-keyed series cache (recompute only what changed)
//! - Queryable indicator table with a polars DataFrame view
//! - Runner configuration loaded from TOML

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod table;

pub use batch::{BatchResult, BatchRunner, RefreshSummary};
pub use cache::SeriesCache;
pub use config::RunnerConfig;
pub use error::RunError;
pub use table::{IndicatorTable, Report, SeriesQuery, SortOrder, OVERVIEW_LIMIT, REPORT_LIMIT};
