//! Look-ahead contamination tests for every indicator column.
//!
//! Invariant: no value at date D may depend on a price or report dated after D.
//!
//! Method: compute on a truncated history (points 0..120) and the full history
//! (points 0..240). Every column must agree on the common prefix. Any
//! difference means a later point leaked into an earlier value.

use chrono::NaiveDate;
use tickerlab_core::indicators::{Ema, Indicator, Rsi, Sma};
use tickerlab_core::{compute_series, EarningsPoint, IndicatorSeries, PricePoint};

/// Deterministic pseudo-random walk using a simple LCG.
fn make_prices(n: usize) -> Vec<PricePoint> {
    let base_date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.05;
            price = (price + change).max(10.0);
            PricePoint::at_close("TEST", base_date + chrono::Duration::days(i as i64), price)
        })
        .collect()
}

fn make_earnings() -> Vec<EarningsPoint> {
    let quarter_ends = [
        (2022, 3, 31),
        (2022, 6, 30),
        (2022, 9, 30),
        (2022, 12, 31),
        (2023, 3, 31),
        (2023, 6, 30),
        (2023, 9, 30),
    ];
    quarter_ends
        .iter()
        .enumerate()
        .map(|(i, (y, m, d))| {
            EarningsPoint::quarterly(
                "TEST",
                NaiveDate::from_ymd_opt(*y, *m, *d).unwrap(),
                Some(1.0 + i as f64 * 0.1),
            )
        })
        .collect()
}

fn assert_prefix_equal(truncated: &IndicatorSeries, full: &IndicatorSeries) {
    let n = truncated.len();
    assert_eq!(&truncated.dates()[..], &full.dates()[..n]);
    assert_eq!(&truncated.fiscal_dates()[..], &full.fiscal_dates()[..n]);
    for name in truncated.column_names() {
        let t = truncated.column(name).unwrap();
        let f = full.column(name).unwrap();
        for i in 0..n {
            assert_eq!(
                t[i].map(f64::to_bits),
                f[i].map(f64::to_bits),
                "{name}: look-ahead at point {i} (truncated={:?}, full={:?})",
                t[i],
                f[i]
            );
        }
    }
}

#[test]
fn no_lookahead_in_any_series_column() {
    let prices = make_prices(240);
    let earnings = make_earnings();
    let full = compute_series("TEST", &prices, &earnings).unwrap();

    let cutoff = prices[119].date;
    let truncated_earnings: Vec<EarningsPoint> = earnings
        .iter()
        .filter(|e| e.fiscal_date_ending <= cutoff)
        .cloned()
        .collect();
    let truncated = compute_series("TEST", &prices[..120], &truncated_earnings).unwrap();

    assert_eq!(truncated.len(), 120);
    assert_prefix_equal(&truncated, &full);
}

#[test]
fn later_reports_do_not_change_earlier_valuations() {
    let prices = make_prices(240);
    let earnings = make_earnings();
    let with_all = compute_series("TEST", &prices, &earnings).unwrap();
    let without_last = compute_series("TEST", &prices, &earnings[..earnings.len() - 1]).unwrap();

    let last_fiscal = earnings[earnings.len() - 1].fiscal_date_ending;
    for (i, date) in with_all.dates().iter().enumerate() {
        if *date < last_fiscal {
            assert_eq!(
                with_all.value("pe_ratio", i),
                without_last.value("pe_ratio", i),
                "valuation at {date} saw a report dated {last_fiscal}"
            );
        }
    }
}

#[test]
fn no_lookahead_single_indicators() {
    let closes: Vec<Option<f64>> = make_prices(200).iter().map(|p| p.close_value()).collect();
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(10)),
        Box::new(Sma::new(50)),
        Box::new(Ema::new(12)),
        Box::new(Ema::new(26)),
        Box::new(Rsi::new(14)),
    ];

    for indicator in &indicators {
        let full = indicator.compute(&closes);
        let truncated = indicator.compute(&closes[..100]);
        assert_eq!(truncated.len(), 100, "{}: length mismatch", indicator.name());
        assert_eq!(
            &truncated[..],
            &full[..100],
            "{}: look-ahead detected",
            indicator.name()
        );
    }
}
