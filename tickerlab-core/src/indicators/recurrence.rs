//! Seeded recurrence engine shared by Wilder smoothing and EMA.
//!
//! A recurrence runs over the eligible range of its input, which begins at
//! the first defined value. At the `period`-th eligible point the smoothed
//! value is seeded from a plain aggregate; every later point applies one
//! smoothing step to the previous value. This is a single forward loop, so
//! there is no depth limit on how much history it can consume.

use serde::{Deserialize, Serialize};

/// How the first smoothed value is established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedRule {
    /// Unweighted mean of the first `period` eligible inputs.
    #[default]
    Mean,
    /// The `period`-th eligible input itself.
    Last,
}

/// One step of the recurrence: previous smoothed value + new input → next value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    /// `(prev * (period - 1) + x) / period`
    Wilder { period: usize },
    /// `x * alpha + prev * (1 - alpha)`
    Exponential { alpha: f64 },
}

impl Smoothing {
    /// Exponential smoothing with `alpha = 2 / (period + 1)`.
    pub fn ema(period: usize) -> Self {
        Smoothing::Exponential {
            alpha: 2.0 / (period as f64 + 1.0),
        }
    }

    pub fn step(&self, prev: f64, x: f64) -> f64 {
        match *self {
            Smoothing::Wilder { period } => {
                let n = period as f64;
                (prev * (n - 1.0) + x) / n
            }
            Smoothing::Exponential { alpha } => x * alpha + prev * (1.0 - alpha),
        }
    }
}

/// A seeded linear recurrence over an ascending series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeededRecurrence {
    period: usize,
    seed: SeedRule,
    smoothing: Smoothing,
}

impl SeededRecurrence {
    pub fn new(period: usize, seed: SeedRule, smoothing: Smoothing) -> Self {
        assert!(period >= 1, "recurrence period must be >= 1");
        Self {
            period,
            seed,
            smoothing,
        }
    }

    /// Wilder smoothing seeded with the mean of the first `period` inputs.
    pub fn wilder(period: usize) -> Self {
        Self::new(period, SeedRule::Mean, Smoothing::Wilder { period })
    }

    /// Exponential moving average seeded with the SMA of the first `period` inputs.
    pub fn ema(period: usize) -> Self {
        Self::new(period, SeedRule::Mean, Smoothing::ema(period))
    }

    pub fn with_seed(mut self, seed: SeedRule) -> Self {
        self.seed = seed;
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn seed_rule(&self) -> SeedRule {
        self.seed
    }

    /// Run the recurrence. Output has the same length as `inputs`.
    ///
    /// Undefined before the seed index. A gap inside the seed window leaves
    /// the whole output undefined; a gap after the seed leaves that point and
    /// everything after it undefined.
    pub fn run(&self, inputs: &[Option<f64>]) -> Vec<Option<f64>> {
        let n = inputs.len();
        let mut result = vec![None; n];

        let Some(start) = inputs.iter().position(Option::is_some) else {
            return result;
        };
        let seed_index = start + self.period - 1;
        if seed_index >= n {
            return result;
        }

        let mut sum = 0.0;
        for v in &inputs[start..=seed_index] {
            match v {
                Some(v) => sum += v,
                None => return result,
            }
        }
        let seed = match self.seed {
            SeedRule::Mean => sum / self.period as f64,
            SeedRule::Last => match inputs[seed_index] {
                Some(v) => v,
                None => return result,
            },
        };
        result[seed_index] = Some(seed);

        let mut prev = seed;
        for i in (seed_index + 1)..n {
            let Some(x) = inputs[i] else {
                break;
            };
            prev = self.smoothing.step(prev, x);
            result[i] = Some(prev);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5; seed at index 2 = mean(10, 11, 12) = 11
        // EMA[3] = 0.5*13 + 0.5*11 = 12; EMA[4] = 0.5*14 + 0.5*12 = 13
        let result = SeededRecurrence::ema(3).run(&some(&[10.0, 11.0, 12.0, 13.0, 14.0]));
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_approx(result[2].unwrap(), 11.0, DEFAULT_EPSILON);
        assert_approx(result[3].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(result[4].unwrap(), 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_step() {
        // seed = mean(2, 4) = 3; next = (3*1 + 7)/2 = 5
        let result = SeededRecurrence::wilder(2).run(&some(&[2.0, 4.0, 7.0]));
        assert_approx(result[1].unwrap(), 3.0, DEFAULT_EPSILON);
        assert_approx(result[2].unwrap(), 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn eligible_range_starts_at_first_defined_input() {
        let inputs = vec![None, None, Some(1.0), Some(3.0), Some(5.0)];
        let result = SeededRecurrence::ema(2).run(&inputs);
        assert_eq!(&result[..3], &[None, None, None]);
        assert_approx(result[3].unwrap(), 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn last_seed_uses_raw_value() {
        let inputs = some(&[1.0, 2.0, 9.0, 4.0]);
        let mean = SeededRecurrence::ema(3).run(&inputs);
        let last = SeededRecurrence::ema(3).with_seed(SeedRule::Last).run(&inputs);
        assert_approx(mean[2].unwrap(), 4.0, DEFAULT_EPSILON);
        assert_approx(last[2].unwrap(), 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn gap_in_seed_window_leaves_all_undefined() {
        let inputs = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let result = SeededRecurrence::ema(3).run(&inputs);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn gap_after_seed_truncates() {
        let inputs = vec![Some(1.0), Some(2.0), Some(3.0), None, Some(5.0)];
        let result = SeededRecurrence::ema(2).run(&inputs);
        assert!(result[1].is_some());
        assert!(result[2].is_some());
        assert_eq!(result[3], None);
        assert_eq!(result[4], None);
    }

    #[test]
    fn too_short_is_undefined() {
        let result = SeededRecurrence::ema(5).run(&some(&[1.0, 2.0]));
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn period_one_tracks_input() {
        let result = SeededRecurrence::ema(1).run(&some(&[100.0, 200.0, 300.0]));
        assert_eq!(result, some(&[100.0, 200.0, 300.0]));
    }
}
