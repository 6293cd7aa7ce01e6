//! Temporal join and ratio engine.
//!
//! Each price point is matched to the latest earnings report whose fiscal
//! date is on or before the trading date ("most recent disclosure no later
//! than this day"). Matching walks both ascending partitions once, so a full
//! partition costs O(prices + reports).

use chrono::NaiveDate;

use crate::indicators::TtmPoint;
use crate::partition::Dated;

impl Dated for TtmPoint {
    fn date(&self) -> NaiveDate {
        self.fiscal_date_ending
    }
}

/// For each date in ascending `dates`, the index of the last report dated on
/// or before it. Reports must be ascending by date.
pub fn as_of_merge<T, I>(dates: I, reports: &[T]) -> Vec<Option<usize>>
where
    T: Dated,
    I: IntoIterator<Item = NaiveDate>,
{
    let mut matched = 0usize;
    let mut prev_date: Option<NaiveDate> = None;
    dates
        .into_iter()
        .map(|date| {
            debug_assert!(
                prev_date.map_or(true, |p| p <= date),
                "as_of_merge requires ascending dates"
            );
            prev_date = Some(date);
            while matched < reports.len() && reports[matched].date() <= date {
                matched += 1;
            }
            matched.checked_sub(1)
        })
        .collect()
}

/// Index of the last report dated on or before `date`, by binary search.
pub fn as_of_lookup<T: Dated>(reports: &[T], date: NaiveDate) -> Option<usize> {
    reports
        .partition_point(|r| r.date() <= date)
        .checked_sub(1)
}

/// Price/earnings ratios for one trading day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Valuation {
    /// Fiscal period end of the matched report, if any.
    pub fiscal_date_ending: Option<NaiveDate>,
    /// EPS of the matched report itself.
    pub reported_eps: Option<f64>,
    pub ttm_eps: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub earnings_yield: Option<f64>,
}

impl Valuation {
    /// Ratios from a close and the matched report's trailing EPS.
    ///
    /// A zero divisor leaves the corresponding ratio undefined.
    pub fn from_close(close: Option<f64>, report: Option<&TtmPoint>) -> Self {
        let Some(report) = report else {
            return Self::default();
        };
        let ttm = report.ttm;
        Self {
            fiscal_date_ending: Some(report.fiscal_date_ending),
            reported_eps: Some(report.reported_eps),
            ttm_eps: ttm,
            pe_ratio: ratio(close, ttm),
            earnings_yield: ratio(ttm, close),
        }
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let r = n / d;
    r.is_finite().then_some(r)
}

/// Join every price to its as-of report and derive the ratios.
pub fn valuations(
    dates: &[NaiveDate],
    closes: &[Option<f64>],
    reports: &[TtmPoint],
) -> Vec<Valuation> {
    as_of_merge(dates.iter().copied(), reports)
        .into_iter()
        .zip(closes)
        .map(|(idx, close)| Valuation::from_close(*close, idx.map(|i| &reports[i])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn report(d: NaiveDate, eps: f64, ttm: Option<f64>) -> TtmPoint {
        TtmPoint {
            fiscal_date_ending: d,
            reported_eps: eps,
            ttm,
        }
    }

    #[test]
    fn merge_picks_latest_on_or_before() {
        let reports = [
            report(date(2023, 3, 31), 1.0, Some(4.0)),
            report(date(2023, 6, 30), 1.2, Some(4.4)),
        ];
        let dates = [
            date(2023, 1, 1),
            date(2023, 3, 31),
            date(2023, 5, 1),
            date(2023, 6, 30),
            date(2023, 7, 15),
        ];
        let matched = as_of_merge(dates, &reports);
        assert_eq!(matched, vec![None, Some(0), Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn lookup_agrees_with_merge() {
        let reports = [
            report(date(2022, 12, 31), 0.5, None),
            report(date(2023, 3, 31), 1.0, None),
            report(date(2023, 6, 30), 1.2, None),
        ];
        let dates: Vec<NaiveDate> = (0..300)
            .map(|i| date(2022, 12, 1) + chrono::Duration::days(i))
            .collect();
        let merged = as_of_merge(dates.iter().copied(), &reports);
        for (d, m) in dates.iter().zip(merged) {
            assert_eq!(as_of_lookup(&reports, *d), m, "mismatch at {d}");
        }
    }

    #[test]
    fn ratios_from_matched_ttm() {
        let r = report(date(2023, 6, 30), 1.2, Some(5.0));
        let v = Valuation::from_close(Some(100.0), Some(&r));
        assert_eq!(v.fiscal_date_ending, Some(date(2023, 6, 30)));
        assert_eq!(v.reported_eps, Some(1.2));
        assert_eq!(v.pe_ratio, Some(20.0));
        assert_eq!(v.earnings_yield, Some(0.05));
    }

    #[test]
    fn no_match_leaves_everything_undefined() {
        assert_eq!(Valuation::from_close(Some(100.0), None), Valuation::default());
    }

    #[test]
    fn undefined_ttm_or_zero_divisor() {
        let pending = report(date(2023, 6, 30), 1.2, None);
        let v = Valuation::from_close(Some(100.0), Some(&pending));
        assert_eq!(v.fiscal_date_ending, Some(date(2023, 6, 30)));
        assert_eq!(v.pe_ratio, None);

        let breakeven = report(date(2023, 6, 30), 0.0, Some(0.0));
        let v = Valuation::from_close(Some(100.0), Some(&breakeven));
        assert_eq!(v.pe_ratio, None);
        assert_eq!(v.earnings_yield, Some(0.0));
    }
}
