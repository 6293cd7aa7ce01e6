//! One daily OHLCV observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single listing on a single day.
///
/// Unique by `(symbol, date)`, or `(symbol, exchange, date)` when partitions
/// are keyed by exchange. Never mutated once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PricePoint {
    /// A flat bar whose OHLC all equal `close`. Useful where only closes matter.
    pub fn at_close(symbol: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: None,
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }

    pub fn on_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Closing price as an indicator input. Non-finite closes are undefined.
    pub fn close_value(&self) -> Option<f64> {
        self.close.is_finite().then_some(self.close)
    }
}
