//! Computed, date-indexed columnar table of one partition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::PartitionKey;

/// Column names.
pub mod columns {
    pub const GAIN: &str = "gain";
    pub const LOSS: &str = "loss";
    pub const AVG_GAIN: &str = "avg_gain";
    pub const AVG_LOSS: &str = "avg_loss";
    pub const RS: &str = "rs";
    pub const RSI: &str = "rsi";
    pub const MACD: &str = "macd";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const MACD_HISTOGRAM: &str = "macd_histogram";
    pub const REPORTED_EPS: &str = "reported_eps";
    pub const TTM_EPS: &str = "ttm_eps";
    pub const PE_RATIO: &str = "pe_ratio";
    pub const EARNINGS_YIELD: &str = "earnings_yield";

    pub fn sma(window: usize) -> String {
        format!("sma_{window}")
    }

    pub fn ema(period: usize) -> String {
        format!("ema_{period}")
    }
}

/// Value-level conditions resolved by omission during computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Cells of the SMA, RSI, MACD and signal columns before the first index
    /// each can be defined at. Gaps from undefined closes are not counted.
    pub insufficient_history: usize,
    /// Points whose RSI was forced to 100 because average loss was zero.
    pub degenerate_rsi: usize,
    /// Quarterly reports skipped for lack of a parseable EPS.
    pub unparseable_eps: usize,
    /// Prices with no earnings report on or before their date.
    pub no_earnings_as_of: usize,
    /// Prices whose close was not a finite number.
    pub undefined_closes: usize,
}

/// One date's worth of an [`IndicatorSeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub key: PartitionKey,
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub fiscal_date_ending: Option<NaiveDate>,
    pub values: BTreeMap<String, Option<f64>>,
}

impl IndicatorRow {
    /// Value of a column, `None` if the column is unknown or undefined here.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }
}

/// Indicator columns for one partition, index-aligned with its dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    key: PartitionKey,
    dates: Vec<NaiveDate>,
    closes: Vec<Option<f64>>,
    fiscal_dates: Vec<Option<NaiveDate>>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
    diagnostics: Diagnostics,
}

impl IndicatorSeries {
    pub fn new(key: PartitionKey, dates: Vec<NaiveDate>, closes: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(dates.len(), closes.len());
        let n = dates.len();
        Self {
            key,
            dates,
            closes,
            fiscal_dates: vec![None; n],
            columns: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Add or replace a column. Its length must match the dates.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.dates.len());
        self.columns.insert(name.into(), values);
    }

    pub fn set_fiscal_dates(&mut self, fiscal_dates: Vec<Option<NaiveDate>>) {
        debug_assert_eq!(fiscal_dates.len(), self.dates.len());
        self.fiscal_dates = fiscal_dates;
    }

    pub fn set_diagnostics(&mut self, diagnostics: Diagnostics) {
        self.diagnostics = diagnostics;
    }

    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes(&self) -> &[Option<f64>] {
        &self.closes
    }

    /// Fiscal date of the report each price was joined to.
    pub fn fiscal_dates(&self) -> &[Option<NaiveDate>] {
        &self.fiscal_dates
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Value of `name` at index `i`.
    pub fn value(&self, name: &str, i: usize) -> Option<f64> {
        self.columns.get(name)?.get(i).copied().flatten()
    }

    /// Index of the first point dated `date`.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let i = self.dates.partition_point(|d| *d < date);
        (self.dates.get(i) == Some(&date)).then_some(i)
    }

    /// Value of `name` on `date`.
    pub fn value_at(&self, name: &str, date: NaiveDate) -> Option<f64> {
        self.value(name, self.index_of(date)?)
    }

    pub fn row(&self, i: usize) -> Option<IndicatorRow> {
        let date = *self.dates.get(i)?;
        Some(IndicatorRow {
            key: self.key.clone(),
            date,
            close: self.closes[i],
            fiscal_date_ending: self.fiscal_dates[i],
            values: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[i]))
                .collect(),
        })
    }

    pub fn last_row(&self) -> Option<IndicatorRow> {
        self.row(self.len().checked_sub(1)?)
    }

    pub fn rows(&self) -> impl Iterator<Item = IndicatorRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }
}
