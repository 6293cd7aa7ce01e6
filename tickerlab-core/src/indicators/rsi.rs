//! Relative Strength Index (RSI).
//!
//! gain[i] = max(close[i] - close[i-1], 0), loss[i] = max(close[i-1] - close[i], 0),
//! defined from index 1. Average gain and loss use Wilder smoothing seeded with
//! the plain mean of the first `period` pairs:
//!   avg[i] = (avg[i-1] * (period - 1) + x[i]) / period
//! RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS).
//! Lookback: period.
//! Edge case: avg_loss == 0 → RS undefined, RSI = 100.

use super::recurrence::SeededRecurrence;
use super::Indicator;

/// Every intermediate series of an RSI computation, index-aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RsiSeries {
    pub gain: Vec<Option<f64>>,
    pub loss: Vec<Option<f64>>,
    pub avg_gain: Vec<Option<f64>>,
    pub avg_loss: Vec<Option<f64>>,
    pub rs: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl RsiSeries {
    /// Number of defined RSI values where avg_loss was exactly zero.
    pub fn degenerate_count(&self) -> usize {
        self.avg_loss
            .iter()
            .filter(|l| matches!(l, Some(l) if *l == 0.0))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Compute gain/loss, smoothed averages, RS and RSI in one pass each.
    pub fn compute_series(&self, closes: &[Option<f64>]) -> RsiSeries {
        let (gain, loss) = gain_loss(closes);
        self.smooth(gain, loss)
    }

    /// Smooth precomputed gain/loss pairs. Used when the eligible range of
    /// the pairs has been narrowed after they were derived from closes.
    pub fn smooth(&self, gain: Vec<Option<f64>>, loss: Vec<Option<f64>>) -> RsiSeries {
        let wilder = SeededRecurrence::wilder(self.period);
        let avg_gain = wilder.run(&gain);
        let avg_loss = wilder.run(&loss);

        let (rs, rsi) = avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(g, l)| match (g, l) {
                (Some(g), Some(l)) => {
                    let (rs, rsi) = relative_strength(*g, *l);
                    (rs, Some(rsi))
                }
                _ => (None, None),
            })
            .unzip();

        RsiSeries {
            gain,
            loss,
            avg_gain,
            avg_loss,
            rs,
            rsi,
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[Option<f64>]) -> Vec<Option<f64>> {
        self.compute_series(closes).rsi
    }
}

/// Per-point gain and loss against the previous close. Index 0 has no
/// previous close and is undefined.
pub fn gain_loss(closes: &[Option<f64>]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let n = closes.len();
    let mut gain = vec![None; n];
    let mut loss = vec![None; n];
    for i in 1..n {
        if let (Some(prev), Some(curr)) = (closes[i - 1], closes[i]) {
            let change = curr - prev;
            gain[i] = Some(if change > 0.0 { change } else { 0.0 });
            loss[i] = Some(if change < 0.0 { -change } else { 0.0 });
        }
    }
    (gain, loss)
}

/// RS and RSI from smoothed averages. RS is undefined when avg_loss is zero.
fn relative_strength(avg_gain: f64, avg_loss: f64) -> (Option<f64>, f64) {
    if avg_loss == 0.0 {
        return (None, 100.0);
    }
    let rs = avg_gain / avg_loss;
    (Some(rs), 100.0 - 100.0 / (1.0 + rs))
}
