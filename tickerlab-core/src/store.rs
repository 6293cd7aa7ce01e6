//! Series store interface and an in-memory implementation.
//!
//! The persistent relational store lives outside this crate; the engine only
//! needs ordered read access per partition. `MemoryStore` mirrors the store's
//! unique keys with insert-or-ignore semantics: the first point for a key wins
//! and later duplicates are dropped silently.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    EarningsPoint, EarningsResponse, PartitionBy, PartitionKey, PricePoint, ReportPeriod,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store '{store}' unavailable: {reason}")]
    Unavailable { store: String, reason: String },

    #[error("invalid record in store '{store}': {reason}")]
    InvalidRecord { store: String, reason: String },
}

/// Read access to stored price and earnings history.
pub trait SeriesStore: Send + Sync {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Distinct partition keys with at least one price, sorted.
    fn keys(&self, by: PartitionBy) -> Result<Vec<PartitionKey>, StoreError>;

    /// Price points of one partition, in any order.
    fn prices(&self, key: &PartitionKey, by: PartitionBy) -> Result<Vec<PricePoint>, StoreError>;

    /// Earnings reports of one symbol, in any order.
    fn earnings(&self, symbol: &str) -> Result<Vec<EarningsPoint>, StoreError>;
}

/// In-memory store keyed like the relational tables.
///
/// Prices are unique per `(partition key, date)` under the store's
/// [`PartitionBy`]; earnings per `(symbol, fiscal_date_ending, period)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    unique_by: PartitionBy,
    prices: Vec<PricePoint>,
    earnings: Vec<EarningsPoint>,
    price_keys: HashSet<(PartitionKey, NaiveDate)>,
    earnings_keys: HashSet<(String, NaiveDate, ReportPeriod)>,
}

impl MemoryStore {
    pub fn new(unique_by: PartitionBy) -> Self {
        Self {
            unique_by,
            ..Self::default()
        }
    }

    /// Insert one price. Returns false if a point with the same key and date exists.
    pub fn insert_price(&mut self, point: PricePoint) -> bool {
        let key = (PartitionKey::of(&point, self.unique_by), point.date);
        if !self.price_keys.insert(key) {
            return false;
        }
        self.prices.push(point);
        true
    }

    /// Insert many prices, returning how many were new.
    pub fn insert_prices<I: IntoIterator<Item = PricePoint>>(&mut self, points: I) -> usize {
        let mut inserted = 0;
        let mut ignored = 0;
        for point in points {
            if self.insert_price(point) {
                inserted += 1;
            } else {
                ignored += 1;
            }
        }
        if ignored > 0 {
            debug!(inserted, ignored, "ignored duplicate prices");
        }
        inserted
    }

    /// Insert one report. Reports without a parseable EPS are stored too.
    pub fn insert_earnings(&mut self, point: EarningsPoint) -> bool {
        let key = (point.symbol.clone(), point.fiscal_date_ending, point.period);
        if !self.earnings_keys.insert(key) {
            return false;
        }
        self.earnings.push(point);
        true
    }

    pub fn insert_earnings_batch<I: IntoIterator<Item = EarningsPoint>>(
        &mut self,
        points: I,
    ) -> usize {
        points
            .into_iter()
            .map(|p| self.insert_earnings(p))
            .filter(|inserted| *inserted)
            .count()
    }

    /// Insert a provider earnings payload (annual and quarterly lists).
    pub fn insert_earnings_json(&mut self, json: &str) -> Result<usize, StoreError> {
        let response: EarningsResponse =
            serde_json::from_str(json).map_err(|e| StoreError::InvalidRecord {
                store: self.name().to_string(),
                reason: e.to_string(),
            })?;
        Ok(self.insert_earnings_batch(response.into_points()))
    }

    /// Most recent stored price date of a symbol. Used to resume ingestion.
    pub fn latest_date(&self, symbol: &str) -> Option<NaiveDate> {
        self.prices
            .iter()
            .filter(|p| p.symbol == symbol)
            .map(|p| p.date)
            .max()
    }

    /// Distinct symbols with at least one price, sorted.
    pub fn symbols(&self) -> Vec<String> {
        self.prices
            .iter()
            .map(|p| p.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn price_count(&self) -> usize {
        self.prices.len()
    }

    pub fn earnings_count(&self) -> usize {
        self.earnings.len()
    }
}

impl SeriesStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn keys(&self, by: PartitionBy) -> Result<Vec<PartitionKey>, StoreError> {
        Ok(self
            .prices
            .iter()
            .map(|p| PartitionKey::of(p, by))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    fn prices(&self, key: &PartitionKey, by: PartitionBy) -> Result<Vec<PricePoint>, StoreError> {
        Ok(self
            .prices
            .iter()
            .filter(|p| key.matches(p, by))
            .cloned()
            .collect())
    }

    fn earnings(&self, symbol: &str) -> Result<Vec<EarningsPoint>, StoreError> {
        Ok(self
            .earnings
            .iter()
            .filter(|e| e.symbol == symbol)
            .cloned()
            .collect())
    }
}
