//! Windowed aggregator over fixed-size trailing windows of one partition.
//!
//! A value at index i covers inputs [i-w+1, i] and is defined only once w
//! inputs exist. A window containing an undefined input is undefined.
//! Every window is summed on its own, oldest input first, so a value is the
//! plain sum of its window and both window forms agree bitwise.

/// Reduction applied to a full window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Sum,
}

impl Aggregate {
    fn finish(self, sum: f64, window: usize) -> f64 {
        match self {
            Aggregate::Mean => sum / window as f64,
            Aggregate::Sum => sum,
        }
    }

    /// Reduce one window given oldest input first.
    fn reduce<'a, I>(self, oldest_first: I, window: usize) -> Option<f64>
    where
        I: IntoIterator<Item = &'a Option<f64>>,
    {
        let sum = oldest_first
            .into_iter()
            .try_fold(0.0, |acc, v| v.map(|v| acc + v))?;
        Some(self.finish(sum, window))
    }
}

/// Trailing aggregate over ascending-ordered inputs.
pub fn trailing(values: &[Option<f64>], window: usize, aggregate: Aggregate) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if window == 0 || n < window {
        return result;
    }

    for (i, slot) in result.iter_mut().enumerate().skip(window - 1) {
        *slot = aggregate.reduce(&values[i + 1 - window..=i], window);
    }

    result
}

/// Aggregate over descending-ordered inputs using the current row and the
/// `window - 1` rows that follow it, i.e. the next `window - 1` older points.
///
/// This is the shape of `ROWS BETWEEN CURRENT ROW AND w-1 FOLLOWING` on a
/// `DESC` ordering. Reversed back to ascending order it equals [`trailing`].
/// Rows without a full window are undefined.
pub fn descending_following(
    values_desc: &[Option<f64>],
    window: usize,
    aggregate: Aggregate,
) -> Vec<Option<f64>> {
    let n = values_desc.len();
    (0..n)
        .map(|j| {
            if window == 0 || j + window > n {
                return None;
            }
            aggregate.reduce(values_desc[j..j + window].iter().rev(), window)
        })
        .collect()
}
