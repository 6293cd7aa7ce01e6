//! Simple Moving Average (SMA).
//!
//! Trailing mean of close prices over a fixed window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::window::{trailing, Aggregate};
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, closes: &[Option<f64>]) -> Vec<Option<f64>> {
        trailing(closes, self.period, Aggregate::Mean)
    }
}
