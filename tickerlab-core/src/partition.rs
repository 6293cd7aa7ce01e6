//! Partitioner: groups observations by key and orders each group by date.
//!
//! Every window and recurrence downstream operates on exactly one partition,
//! so nothing computed for one symbol can see another symbol's data.

use chrono::NaiveDate;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::{EarningsPoint, PartitionBy, PartitionKey, PricePoint};

/// Anything carrying the date it is ordered by.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for PricePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for EarningsPoint {
    fn date(&self) -> NaiveDate {
        self.fiscal_date_ending
    }
}

impl<T: Dated> Dated for &T {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    /// No points exist for the requested key. Callers treat this as
    /// "no indicators computable", not as a failure of the data.
    #[error("empty partition: no points for '{key}'")]
    EmptyPartition { key: PartitionKey },
}

/// Date-ordered points sharing one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    key: PartitionKey,
    points: Vec<T>,
}

impl<T: Dated> Partition<T> {
    /// Stable-sort `points` ascending by date. Equal dates keep insertion order.
    pub fn from_unsorted(key: PartitionKey, mut points: Vec<T>) -> Self {
        points.sort_by_key(|p| p.date());
        Self { key, points }
    }

    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    pub fn points(&self) -> &[T] {
        &self.points
    }

    pub fn into_points(self) -> Vec<T> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date())
    }
}

/// Splits raw observations into per-key partitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Partitioner {
    by: PartitionBy,
}

impl Partitioner {
    pub fn new(by: PartitionBy) -> Self {
        Self { by }
    }

    pub fn partition_by(&self) -> PartitionBy {
        self.by
    }

    /// Group price points, owned or borrowed, by key. Keys iterate in sorted order.
    pub fn partition_prices<I, P>(&self, points: I) -> BTreeMap<PartitionKey, Partition<P>>
    where
        I: IntoIterator<Item = P>,
        P: Borrow<PricePoint> + Dated,
    {
        let mut groups: BTreeMap<PartitionKey, Vec<P>> = BTreeMap::new();
        for point in points {
            groups
                .entry(PartitionKey::of(Borrow::<PricePoint>::borrow(&point), self.by))
                .or_default()
                .push(point);
        }
        groups
            .into_iter()
            .map(|(key, points)| (key.clone(), Partition::from_unsorted(key, points)))
            .collect()
    }

    /// Group earnings by symbol. Reports carry no exchange, so every listing
    /// of a symbol shares one earnings partition.
    pub fn partition_earnings<I, P>(&self, points: I) -> BTreeMap<String, Partition<P>>
    where
        I: IntoIterator<Item = P>,
        P: Borrow<EarningsPoint> + Dated,
    {
        let mut groups: BTreeMap<String, Vec<P>> = BTreeMap::new();
        for point in points {
            let symbol = Borrow::<EarningsPoint>::borrow(&point).symbol.clone();
            groups.entry(symbol).or_default().push(point);
        }
        groups
            .into_iter()
            .map(|(symbol, points)| {
                let key = PartitionKey::symbol(symbol.clone());
                (symbol, Partition::from_unsorted(key, points))
            })
            .collect()
    }

    /// The ordered price partition for one key.
    pub fn prices_for<'a>(
        &self,
        key: &PartitionKey,
        points: &'a [PricePoint],
    ) -> Result<Partition<&'a PricePoint>, PartitionError> {
        let selected: Vec<&PricePoint> = points
            .iter()
            .filter(|p| key.matches(p, self.by))
            .collect();
        if selected.is_empty() {
            return Err(PartitionError::EmptyPartition { key: key.clone() });
        }
        Ok(Partition::from_unsorted(key.clone(), selected))
    }

    /// The ordered earnings partition for one symbol.
    pub fn earnings_for<'a>(
        &self,
        symbol: &str,
        points: &'a [EarningsPoint],
    ) -> Result<Partition<&'a EarningsPoint>, PartitionError> {
        let key = PartitionKey::symbol(symbol);
        let selected: Vec<&EarningsPoint> =
            points.iter().filter(|p| p.symbol == symbol).collect();
        if selected.is_empty() {
            return Err(PartitionError::EmptyPartition { key });
        }
        Ok(Partition::from_unsorted(key, selected))
    }
}
