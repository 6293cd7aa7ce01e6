//! Indicator computations.
//!
//! Two engines carry everything: the windowed aggregator (`window`) for
//! trailing means and sums, and the seeded recurrence (`recurrence`) for
//! Wilder smoothing and exponential averages. The concrete indicators are
//! thin parameterizations of those two.
//!
//! Inputs and outputs are `Option<f64>` series aligned with the partition.
//! `None` means "undefined" (insufficient history or an undefined input);
//! it is never zero.

pub mod ema;
pub mod macd;
pub mod recurrence;
pub mod rsi;
pub mod sma;
pub mod ttm;
pub mod window;

pub use ema::Ema;
pub use macd::{Macd, MacdSeries};
pub use recurrence::{SeedRule, SeededRecurrence, Smoothing};
pub use rsi::{gain_loss, Rsi, RsiSeries};
pub use sma::Sma;
pub use ttm::{trailing_eps, TtmPoint};
pub use window::{descending_following, trailing, Aggregate};

/// Single-series indicator over close prices.
///
/// # Look-ahead contamination guard
/// No output at index t may depend on inputs after t. Every indicator must
/// pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of points needed before the indicator produces output.
    fn lookback(&self) -> usize;

    /// Compute over the whole series. The result has the same length as
    /// `closes`; the first `lookback()` values are `None`.
    fn compute(&self, closes: &[Option<f64>]) -> Vec<Option<f64>>;
}

/// Wrap raw closes as defined inputs, for tests.
#[cfg(test)]
pub fn closes(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
