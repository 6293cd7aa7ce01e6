//! Indicator engine: turns one partition's raw history into its IndicatorSeries.
//!
//! Pipeline per partition:
//! 1. Select and date-order the partition's prices (and its symbol's earnings).
//! 2. Windowed aggregates (SMA family) over the closes.
//! 3. Gain/loss from the closes, then the seeded recurrences (RSI, EMA legs,
//!    MACD signal), optionally restricted to a trailing calendar window.
//! 4. Trailing EPS over quarterly reports, then the as-of join for P/E and
//!    earnings yield.
//!
//! Every step is a pure function of the partition, so output is bitwise
//! deterministic and independent of every other partition.

use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::config::{ConfigError, IndicatorConfig};
use crate::domain::{EarningsPoint, PartitionKey, PricePoint};
use crate::indicators::{gain_loss, trailing_eps, Indicator, Macd, Rsi, Sma};
use crate::join::valuations;
use crate::partition::{PartitionError, Partitioner};
use crate::series::{columns, Diagnostics, IndicatorSeries};

/// Computes indicator series under one validated config.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    partitioner: Partitioner,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        let config = IndicatorConfig::default();
        Self {
            partitioner: Partitioner::new(config.partition_by),
            config,
        }
    }
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            partitioner: Partitioner::new(config.partition_by),
            config,
        })
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn partitioner(&self) -> Partitioner {
        self.partitioner
    }

    /// Compute the series of the partition `key`.
    ///
    /// `prices` and `earnings` may hold other partitions' points and may be
    /// unordered. Fails only when `prices` has no point for `key`; missing
    /// earnings leave the valuation columns undefined.
    pub fn compute_series(
        &self,
        key: &PartitionKey,
        prices: &[PricePoint],
        earnings: &[EarningsPoint],
    ) -> Result<IndicatorSeries, PartitionError> {
        let partition = self.partitioner.prices_for(key, prices)?;
        let reports = match self.partitioner.earnings_for(&key.symbol, earnings) {
            Ok(partition) => partition.into_points(),
            Err(PartitionError::EmptyPartition { .. }) => Vec::new(),
        };
        Ok(self.compute_partition(key, partition.points(), &reports))
    }

    /// Compute every partition present in `prices`, sequentially, in key order.
    ///
    /// Both inputs are partitioned once up front.
    pub fn compute_all(
        &self,
        prices: &[PricePoint],
        earnings: &[EarningsPoint],
    ) -> BTreeMap<PartitionKey, IndicatorSeries> {
        let price_partitions = self.partitioner.partition_prices(prices);
        let earnings_partitions = self.partitioner.partition_earnings(earnings);
        let no_earnings: &[&EarningsPoint] = &[];

        price_partitions
            .into_iter()
            .map(|(key, partition)| {
                let reports = earnings_partitions
                    .get(&key.symbol)
                    .map_or(no_earnings, |p| p.points());
                let series = self.compute_partition(&key, partition.points(), reports);
                (key, series)
            })
            .collect()
    }

    /// Run the pipeline over one non-empty, date-ordered price partition and
    /// its symbol's date-ordered reports.
    #[instrument(skip_all, fields(key = %key))]
    fn compute_partition(
        &self,
        key: &PartitionKey,
        points: &[&PricePoint],
        reports: &[&EarningsPoint],
    ) -> IndicatorSeries {
        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        let closes: Vec<Option<f64>> = points.iter().map(|p| p.close_value()).collect();
        let mut diagnostics = Diagnostics {
            undefined_closes: closes.iter().filter(|c| c.is_none()).count(),
            ..Diagnostics::default()
        };

        let mut series = IndicatorSeries::new(key.clone(), dates.clone(), closes.clone());

        for &window in &self.config.sma_windows {
            let sma = Sma::new(window);
            series.insert_column(sma.name().to_string(), sma.compute(&closes));
        }

        let (gain, loss) = gain_loss(&closes);
        let eligible_from = self.eligible_start(&dates);
        let recurrence_closes = mask_before(&closes, eligible_from);

        let rsi = Rsi::new(self.config.rsi_period)
            .smooth(mask_before(&gain, eligible_from), mask_before(&loss, eligible_from));
        diagnostics.degenerate_rsi = rsi.degenerate_count();

        let m = &self.config.macd;
        let macd = Macd::new(m.fast, m.slow, m.signal)
            .with_signal_seed(m.signal_seed)
            .compute_series(&recurrence_closes);

        series.insert_column(columns::GAIN, gain);
        series.insert_column(columns::LOSS, loss);
        series.insert_column(columns::AVG_GAIN, rsi.avg_gain);
        series.insert_column(columns::AVG_LOSS, rsi.avg_loss);
        series.insert_column(columns::RS, rsi.rs);
        series.insert_column(columns::RSI, rsi.rsi);
        series.insert_column(columns::ema(m.fast), macd.ema_fast);
        series.insert_column(columns::ema(m.slow), macd.ema_slow);
        series.insert_column(columns::MACD, macd.macd);
        series.insert_column(columns::MACD_SIGNAL, macd.signal);
        series.insert_column(columns::MACD_HISTOGRAM, macd.histogram);

        let (reports, unparseable) = trailing_eps(reports, self.config.ttm_quarters);
        diagnostics.unparseable_eps = unparseable;
        let joined = valuations(&dates, &closes, &reports);
        diagnostics.no_earnings_as_of = joined
            .iter()
            .filter(|v| v.fiscal_date_ending.is_none())
            .count();

        series.set_fiscal_dates(joined.iter().map(|v| v.fiscal_date_ending).collect());
        series.insert_column(
            columns::REPORTED_EPS,
            joined.iter().map(|v| v.reported_eps).collect(),
        );
        series.insert_column(columns::TTM_EPS, joined.iter().map(|v| v.ttm_eps).collect());
        series.insert_column(columns::PE_RATIO, joined.iter().map(|v| v.pe_ratio).collect());
        series.insert_column(
            columns::EARNINGS_YIELD,
            joined.iter().map(|v| v.earnings_yield).collect(),
        );

        diagnostics.insufficient_history = self.insufficient_history(series.len(), eligible_from);
        series.set_diagnostics(diagnostics);

        debug!(
            points = series.len(),
            reports = reports.len(),
            eligible_from,
            insufficient = diagnostics.insufficient_history,
            degenerate_rsi = diagnostics.degenerate_rsi,
            unparseable_eps = diagnostics.unparseable_eps,
            no_earnings_as_of = diagnostics.no_earnings_as_of,
            "computed indicator series"
        );

        series
    }

    /// Distinct partition keys of `prices` under the configured partitioning, sorted.
    pub fn keys(&self, prices: &[PricePoint]) -> Vec<PartitionKey> {
        let mut keys: Vec<PartitionKey> = prices
            .iter()
            .map(|p| PartitionKey::of(p, self.config.partition_by))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// First index whose date lies strictly after `last_date - days`.
    fn eligible_start(&self, dates: &[NaiveDate]) -> usize {
        let (Some(days), Some(last)) = (self.config.recurrence_window_days, dates.last()) else {
            return 0;
        };
        match last.checked_sub_days(Days::new(u64::from(days))) {
            Some(cutoff) => dates.partition_point(|d| *d <= cutoff),
            None => 0,
        }
    }

    /// Cells of the SMA, RSI, MACD and signal columns that precede the first
    /// index each column can be defined at, given where recurrences start.
    fn insufficient_history(&self, len: usize, eligible_from: usize) -> usize {
        let m = &self.config.macd;
        let rsi_first = eligible_from.max(1) + self.config.rsi_period - 1;
        let macd_first = eligible_from + m.fast.max(m.slow) - 1;
        let signal_first = macd_first + m.signal - 1;
        self.config
            .sma_windows
            .iter()
            .map(|w| w - 1)
            .chain([rsi_first, macd_first, signal_first])
            .map(|first| first.min(len))
            .sum()
    }
}

fn mask_before(values: &[Option<f64>], start: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| if i < start { None } else { *v })
        .collect()
}

/// Compute the indicator series of `symbol` with the default config.
pub fn compute_series(
    symbol: &str,
    prices: &[PricePoint],
    earnings: &[EarningsPoint],
) -> Result<IndicatorSeries, PartitionError> {
    IndicatorEngine::default().compute_series(&PartitionKey::symbol(symbol), prices, earnings)
}
