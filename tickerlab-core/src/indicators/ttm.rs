//! Trailing-twelve-month EPS.
//!
//! Sum of the most recent four quarterly reported EPS values, defined from
//! the fourth quarter on. Annual reports and reports without a parseable EPS
//! never enter the sum.

use chrono::NaiveDate;

use super::window::{trailing, Aggregate};
use crate::domain::{EarningsPoint, ReportPeriod};

/// One quarterly report with its trailing sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TtmPoint {
    pub fiscal_date_ending: NaiveDate,
    pub reported_eps: f64,
    pub ttm: Option<f64>,
}

/// Trailing EPS over an ascending earnings partition.
///
/// Only aggregatable reports appear in the output. The second value is the
/// number of quarterly reports skipped for lack of a parseable EPS.
pub fn trailing_eps(reports: &[&EarningsPoint], quarters: usize) -> (Vec<TtmPoint>, usize) {
    let mut unparseable = 0usize;
    let eligible: Vec<(NaiveDate, f64)> = reports
        .iter()
        .filter(|r| r.period == ReportPeriod::Quarterly)
        .filter_map(|r| match r.reported_eps {
            Some(eps) => Some((r.fiscal_date_ending, eps)),
            None => {
                unparseable += 1;
                None
            }
        })
        .collect();

    let values: Vec<Option<f64>> = eligible.iter().map(|(_, eps)| Some(*eps)).collect();
    let sums = trailing(&values, quarters, Aggregate::Sum);

    let points = eligible
        .into_iter()
        .zip(sums)
        .map(|((fiscal_date_ending, reported_eps), ttm)| TtmPoint {
            fiscal_date_ending,
            reported_eps,
            ttm,
        })
        .collect();

    (points, unparseable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    fn quarter(m: u32, eps: Option<f64>) -> EarningsPoint {
        EarningsPoint::quarterly("AAA", NaiveDate::from_ymd_opt(2023, m, 28).unwrap(), eps)
    }

    #[test]
    fn undefined_until_fourth_quarter() {
        let reports = [
            quarter(1, Some(1.0)),
            quarter(4, Some(2.0)),
            quarter(7, Some(3.0)),
            quarter(10, Some(4.0)),
            quarter(12, Some(5.0)),
        ];
        let refs: Vec<&EarningsPoint> = reports.iter().collect();
        let (points, skipped) = trailing_eps(&refs, 4);
        assert_eq!(skipped, 0);
        assert!(points[..3].iter().all(|p| p.ttm.is_none()));
        assert_approx(points[3].ttm.unwrap(), 10.0, 1e-12);
        assert_approx(points[4].ttm.unwrap(), 14.0, 1e-12);
    }

    #[test]
    fn unparseable_reports_are_skipped() {
        let reports = [
            quarter(1, Some(1.0)),
            quarter(3, None),
            quarter(4, Some(2.0)),
            quarter(7, Some(3.0)),
            quarter(10, Some(4.0)),
        ];
        let refs: Vec<&EarningsPoint> = reports.iter().collect();
        let (points, skipped) = trailing_eps(&refs, 4);
        assert_eq!(skipped, 1);
        assert_eq!(points.len(), 4);
        assert_approx(points[3].ttm.unwrap(), 10.0, 1e-12);
    }

    #[test]
    fn annual_reports_ignored() {
        let annual = EarningsPoint::annual(
            "AAA",
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            Some(9.0),
        );
        let refs = vec![&annual];
        let (points, skipped) = trailing_eps(&refs, 4);
        assert!(points.is_empty());
        assert_eq!(skipped, 0);
    }
}
