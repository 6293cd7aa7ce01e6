//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = close[t] * alpha + EMA[t-1] * (1 - alpha), alpha = 2/(period+1)
//! Seed: EMA[period-1] = SMA of the first `period` closes (or the raw close
//! under `SeedRule::Last`).
//! Lookback: period - 1.

use super::recurrence::{SeedRule, SeededRecurrence};
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    recurrence: SeededRecurrence,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            recurrence: SeededRecurrence::ema(period),
            name: format!("ema_{period}"),
        }
    }

    pub fn with_seed(mut self, seed: SeedRule) -> Self {
        self.recurrence = self.recurrence.with_seed(seed);
        self
    }

    pub fn period(&self) -> usize {
        self.recurrence.period()
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.recurrence.period().saturating_sub(1)
    }

    fn compute(&self, closes: &[Option<f64>]) -> Vec<Option<f64>> {
        self.recurrence.run(closes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, closes};

    #[test]
    fn ema_lookback() {
        assert_eq!(Ema::new(26).lookback(), 25);
        assert_eq!(Ema::new(1).lookback(), 0);
    }

    #[test]
    fn ema_12_seed_is_sma() {
        let values: Vec<f64> = (1..=12).map(f64::from).collect();
        let result = Ema::new(12).compute(&closes(&values));
        assert!(result[10].is_none());
        assert_approx(result[11].unwrap(), 6.5, 1e-12);
    }

    #[test]
    fn ema_converges_to_constant() {
        let result = Ema::new(26).compute(&closes(&vec![42.0; 26 + 50]));
        assert_approx(result.last().copied().flatten().unwrap(), 42.0, 1e-9);
    }

    #[test]
    fn ema_alpha_step() {
        // period 12: alpha = 2/13
        let mut values = vec![10.0; 12];
        values.push(23.0);
        let result = Ema::new(12).compute(&closes(&values));
        let alpha = 2.0 / 13.0;
        assert_approx(result[12].unwrap(), 23.0 * alpha + 10.0 * (1.0 - alpha), 1e-12);
    }
}
