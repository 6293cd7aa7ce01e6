//! Indicator table: the queryable union of computed series.
//!
//! This is the relation a reporting front end reads: filter by symbol and
//! date range, project columns, sort by date, limit. It also converts to a
//! polars `DataFrame` for ad-hoc analysis.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use tickerlab_core::series::columns;
use tickerlab_core::{IndicatorRow, IndicatorSeries, PartitionKey};

use crate::error::RunError;

/// Rows in the per-symbol overview.
pub const OVERVIEW_LIMIT: usize = 30;
/// Rows in a single-indicator report.
pub const REPORT_LIMIT: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// Canned single-indicator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Report {
    /// P/E ratio and earnings yield with the joined EPS and trailing EPS.
    Valuation,
    Sma { window: usize },
    Rsi,
    Macd,
}

impl Report {
    pub fn columns(&self) -> Vec<String> {
        match self {
            Report::Valuation => vec![
                columns::REPORTED_EPS.into(),
                columns::TTM_EPS.into(),
                columns::PE_RATIO.into(),
                columns::EARNINGS_YIELD.into(),
            ],
            Report::Sma { window } => vec![columns::sma(*window)],
            Report::Rsi => vec![
                columns::GAIN.into(),
                columns::LOSS.into(),
                columns::AVG_GAIN.into(),
                columns::AVG_LOSS.into(),
                columns::RS.into(),
                columns::RSI.into(),
            ],
            Report::Macd => vec![
                columns::MACD.into(),
                columns::MACD_SIGNAL.into(),
                columns::MACD_HISTOGRAM.into(),
            ],
        }
    }
}

/// Filter / projection / ordering over an [`IndicatorTable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesQuery {
    pub symbol: Option<String>,
    pub exchange: Option<String>,
    /// Inclusive lower date bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub to: Option<NaiveDate>,
    /// Columns to keep. `None` keeps every column.
    pub columns: Option<Vec<String>>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl SeriesQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Self::default()
        }
    }

    /// The most recent rows of one symbol with valuation, SMA and RSI.
    pub fn overview(symbol: impl Into<String>, sma_window: usize) -> Self {
        Self::for_symbol(symbol)
            .with_columns([
                columns::PE_RATIO.to_string(),
                columns::EARNINGS_YIELD.to_string(),
                columns::sma(sma_window),
                columns::RSI.to_string(),
            ])
            .with_limit(OVERVIEW_LIMIT)
    }

    pub fn report(symbol: impl Into<String>, report: Report) -> Self {
        Self::for_symbol(symbol)
            .with_columns(report.columns())
            .with_limit(REPORT_LIMIT)
    }

    pub fn on_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn selects(&self, key: &PartitionKey) -> bool {
        self.symbol.as_ref().map_or(true, |s| *s == key.symbol)
            && self
                .exchange
                .as_ref()
                .map_or(true, |e| key.exchange.as_ref() == Some(e))
    }

    fn in_range(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Union of computed series, one per partition key.
#[derive(Debug, Clone, Default)]
pub struct IndicatorTable {
    series: BTreeMap<PartitionKey, Arc<IndicatorSeries>>,
}

impl IndicatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_series<I: IntoIterator<Item = IndicatorSeries>>(series: I) -> Self {
        Self::from_shared(series.into_iter().map(Arc::new))
    }

    pub fn from_shared<I: IntoIterator<Item = Arc<IndicatorSeries>>>(series: I) -> Self {
        Self {
            series: series.into_iter().map(|s| (s.key().clone(), s)).collect(),
        }
    }

    /// Add a series, replacing any previous one for the same key.
    pub fn insert(&mut self, series: IndicatorSeries) {
        self.series.insert(series.key().clone(), Arc::new(series));
    }

    pub fn get(&self, key: &PartitionKey) -> Option<&IndicatorSeries> {
        self.series.get(key).map(Arc::as_ref)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PartitionKey> {
        self.series.keys()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of rows across all series.
    pub fn row_count(&self) -> usize {
        self.series.values().map(|s| s.len()).sum()
    }

    /// Rows matching `query`, sorted by date (then key) in the requested order.
    pub fn query(&self, query: &SeriesQuery) -> Result<Vec<IndicatorRow>, RunError> {
        if let Some(wanted) = &query.columns {
            self.check_columns(wanted)?;
        }

        let mut rows: Vec<IndicatorRow> = self
            .series
            .values()
            .filter(|s| query.selects(s.key()))
            .flat_map(|s| {
                s.dates()
                    .iter()
                    .enumerate()
                    .filter(move |(_, d)| query.in_range(**d))
                    .filter_map(move |(i, _)| s.row(i))
            })
            .collect();

        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.key.cmp(&b.key)));
        if query.order == SortOrder::Descending {
            rows.reverse();
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        if let Some(wanted) = &query.columns {
            for row in &mut rows {
                row.values.retain(|name, _| wanted.contains(name));
            }
        }
        Ok(rows)
    }

    /// The most recent row of every partition, in key order.
    pub fn latest_per_symbol(&self) -> Vec<IndicatorRow> {
        self.series.values().filter_map(|s| s.last_row()).collect()
    }

    /// Rows matching `query` as a polars DataFrame.
    ///
    /// Columns: symbol, exchange, date, close, fiscal_date_ending, then the
    /// projected indicator columns in query order (or sorted by name).
    pub fn to_dataframe(&self, query: &SeriesQuery) -> Result<DataFrame, RunError> {
        let rows = self.query(query)?;
        let names: Vec<String> = match &query.columns {
            Some(wanted) => wanted.clone(),
            None => self.column_names(),
        };
        rows_to_dataframe(&rows, &names)
    }

    /// Union of column names across all series, sorted.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .series
            .values()
            .flat_map(|s| s.column_names().map(str::to_string).collect::<Vec<_>>())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn check_columns(&self, wanted: &[String]) -> Result<(), RunError> {
        if self.series.is_empty() {
            return Ok(());
        }
        let known = self.column_names();
        match wanted.iter().find(|w| !known.contains(w)) {
            Some(unknown) => Err(RunError::UnknownColumn(unknown.clone())),
            None => Ok(()),
        }
    }
}

/// Days since 1970-01-01, the physical representation of a polars Date.
fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - 719_163
}

fn rows_to_dataframe(rows: &[IndicatorRow], names: &[String]) -> Result<DataFrame, RunError> {
    let symbols: Vec<String> = rows.iter().map(|r| r.key.symbol.clone()).collect();
    let exchanges: Vec<Option<String>> = rows.iter().map(|r| r.key.exchange.clone()).collect();
    let dates: Vec<i32> = rows.iter().map(|r| epoch_days(r.date)).collect();
    let closes: Vec<Option<f64>> = rows.iter().map(|r| r.close).collect();
    let fiscal: Vec<Option<i32>> = rows
        .iter()
        .map(|r| r.fiscal_date_ending.map(epoch_days))
        .collect();

    let mut frame_columns = vec![
        Column::new("symbol".into(), symbols),
        Column::new("exchange".into(), exchanges),
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| RunError::Frame(format!("date cast: {e}")))?,
        Column::new("close".into(), closes),
        Column::new("fiscal_date_ending".into(), fiscal)
            .cast(&DataType::Date)
            .map_err(|e| RunError::Frame(format!("fiscal date cast: {e}")))?,
    ];
    for name in names {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.get(name)).collect();
        frame_columns.push(Column::new(name.as_str().into(), values));
    }

    DataFrame::new(frame_columns).map_err(|e| RunError::Frame(format!("dataframe creation: {e}")))
}
