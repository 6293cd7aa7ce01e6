//! Moving Average Convergence Divergence (MACD).
//!
//! MACD = EMA(fast) - EMA(slow), defined where both legs are.
//! Signal = EMA(signal) over the MACD series, whose eligible range starts at
//! the first defined MACD value. Histogram = MACD - Signal.
//! Lookback: slow + signal - 2 for the signal line.

use super::recurrence::{SeedRule, SeededRecurrence};

/// Both EMA legs plus the derived lines, index-aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub ema_fast: Vec<Option<f64>>,
    pub ema_slow: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    signal_seed: SeedRule,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(
            fast >= 1 && slow >= 1 && signal >= 1,
            "MACD periods must be >= 1"
        );
        Self {
            fast,
            slow,
            signal,
            signal_seed: SeedRule::Mean,
        }
    }

    /// Seed rule for the signal line only. The EMA legs are always SMA-seeded.
    pub fn with_signal_seed(mut self, seed: SeedRule) -> Self {
        self.signal_seed = seed;
        self
    }

    pub fn lookback(&self) -> usize {
        self.fast.max(self.slow) + self.signal - 2
    }

    pub fn compute_series(&self, closes: &[Option<f64>]) -> MacdSeries {
        let ema_fast = SeededRecurrence::ema(self.fast).run(closes);
        let ema_slow = SeededRecurrence::ema(self.slow).run(closes);
        let macd = difference(&ema_fast, &ema_slow);
        let signal = SeededRecurrence::ema(self.signal)
            .with_seed(self.signal_seed)
            .run(&macd);
        let histogram = difference(&macd, &signal);

        MacdSeries {
            ema_fast,
            ema_slow,
            macd,
            signal,
            histogram,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

fn difference(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(a, b)| Some((*a)? - (*b)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, closes};

    fn ramp(n: usize) -> Vec<Option<f64>> {
        closes(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>())
    }

    #[test]
    fn macd_defined_from_slow_leg() {
        let result = Macd::default().compute_series(&ramp(40));
        assert!(result.macd[24].is_none());
        assert!(result.macd[25].is_some());
        let expected = result.ema_fast[25].unwrap() - result.ema_slow[25].unwrap();
        assert_approx(result.macd[25].unwrap(), expected, 1e-12);
    }

    #[test]
    fn signal_seeded_with_mean_of_first_nine_macd() {
        let result = Macd::default().compute_series(&ramp(60));
        // first MACD at 25, ninth at 33
        assert!(result.signal[32].is_none());
        let mean: f64 = result.macd[25..=33].iter().map(|v| v.unwrap()).sum::<f64>() / 9.0;
        assert_approx(result.signal[33].unwrap(), mean, 1e-12);
        let hist = result.macd[33].unwrap() - result.signal[33].unwrap();
        assert_approx(result.histogram[33].unwrap(), hist, 1e-12);
    }

    #[test]
    fn last_seed_reproduces_raw_ninth_macd() {
        let result = Macd::default()
            .with_signal_seed(SeedRule::Last)
            .compute_series(&ramp(60));
        assert_eq!(result.signal[33], result.macd[33]);
        assert_eq!(result.histogram[33], Some(0.0));
    }

    #[test]
    fn short_history_has_no_macd() {
        let result = Macd::default().compute_series(&ramp(20));
        assert!(result.macd.iter().all(Option::is_none));
        assert!(result.signal.iter().all(Option::is_none));
    }

    #[test]
    fn lookback_covers_signal() {
        assert_eq!(Macd::default().lookback(), 33);
    }
}
