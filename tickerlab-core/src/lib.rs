//! TickerLab Core: per-symbol technical indicators over daily price and earnings history.
//!
//! This crate contains the computation core:
//! - Domain types (price points, earnings reports, partition keys)
//! - Partitioner and the two shared engines (windowed aggregates, seeded recurrences)
//! - SMA, RSI, EMA/MACD and trailing EPS built on those engines
//! - As-of join of prices to earnings for P/E and earnings yield
//! - `IndicatorEngine` / `compute_series` producing an `IndicatorSeries`
//! - Store interface, history fingerprints and TOML configuration
//!
//! No I/O happens here beyond reading a config file on request.

pub mod compute;
pub mod config;
pub mod domain;
pub mod fingerprint;
pub mod indicators;
pub mod join;
pub mod partition;
pub mod series;
pub mod store;

pub use compute::{compute_series, IndicatorEngine};
pub use config::{ConfigError, IndicatorConfig, MacdConfig};
pub use domain::{EarningsPoint, PartitionBy, PartitionKey, PricePoint, ReportPeriod};
pub use fingerprint::HistoryFingerprint;
pub use partition::{Partition, PartitionError, Partitioner};
pub use series::{Diagnostics, IndicatorRow, IndicatorSeries};
pub use store::{MemoryStore, SeriesStore, StoreError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner moves across threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PricePoint>();
        require_sync::<PricePoint>();
        require_send::<EarningsPoint>();
        require_sync::<EarningsPoint>();
        require_send::<PartitionKey>();
        require_sync::<PartitionKey>();

        require_send::<IndicatorEngine>();
        require_sync::<IndicatorEngine>();
        require_send::<IndicatorSeries>();
        require_sync::<IndicatorSeries>();
        require_send::<HistoryFingerprint>();
        require_sync::<HistoryFingerprint>();

        require_send::<MemoryStore>();
        require_sync::<MemoryStore>();
        require_send::<StoreError>();
        require_send::<ConfigError>();
    }
}
