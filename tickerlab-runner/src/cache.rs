//! Series cache keyed by history fingerprint.
//!
//! Series are recomputed in full whenever a partition's history changes
//! (recompute-on-append). The cache remembers the fingerprint each series
//! was computed from and hands the stored series back while it still matches.

use std::collections::HashMap;
use std::sync::Arc;

use tickerlab_core::{
    EarningsPoint, HistoryFingerprint, IndicatorEngine, IndicatorSeries, PartitionError,
    PartitionKey, PricePoint,
};

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: HistoryFingerprint,
    series: Arc<IndicatorSeries>,
}

#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: HashMap<PartitionKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached series for `key` if it was computed from `fingerprint`.
    /// Counts a hit or a miss.
    pub fn lookup(
        &mut self,
        key: &PartitionKey,
        fingerprint: &HistoryFingerprint,
    ) -> Option<Arc<IndicatorSeries>> {
        match self.entries.get(key) {
            Some(entry) if entry.fingerprint == *fingerprint => {
                self.hits += 1;
                Some(Arc::clone(&entry.series))
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(
        &mut self,
        key: PartitionKey,
        fingerprint: HistoryFingerprint,
        series: IndicatorSeries,
    ) -> Arc<IndicatorSeries> {
        let series = Arc::new(series);
        self.entries.insert(
            key,
            CacheEntry {
                fingerprint,
                series: Arc::clone(&series),
            },
        );
        series
    }

    /// Cached series for one partition, recomputing it if its history changed.
    ///
    /// `prices` and `earnings` should be the partition's own history, as a
    /// store returns it for `key`; other partitions' points would change the
    /// fingerprint without changing the series.
    pub fn get_or_compute(
        &mut self,
        engine: &IndicatorEngine,
        key: &PartitionKey,
        prices: &[PricePoint],
        earnings: &[EarningsPoint],
    ) -> Result<Arc<IndicatorSeries>, PartitionError> {
        let fingerprint = HistoryFingerprint::compute(key, prices, earnings, engine.config());
        if let Some(series) = self.lookup(key, &fingerprint) {
            return Ok(series);
        }
        let series = engine.compute_series(key, prices, earnings)?;
        Ok(self.insert(key.clone(), fingerprint, series))
    }

    /// The cached series for `key`, whatever history it came from.
    pub fn get(&self, key: &PartitionKey) -> Option<Arc<IndicatorSeries>> {
        self.entries.get(key).map(|e| Arc::clone(&e.series))
    }

    pub fn fingerprint(&self, key: &PartitionKey) -> Option<&HistoryFingerprint> {
        self.entries.get(key).map(|e| &e.fingerprint)
    }

    pub fn invalidate(&mut self, key: &PartitionKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry whose key fails `keep`. Returns the dropped keys, sorted.
    pub fn retain<F: FnMut(&PartitionKey) -> bool>(&mut self, mut keep: F) -> Vec<PartitionKey> {
        let mut dropped: Vec<PartitionKey> = self
            .entries
            .keys()
            .filter(|k| !keep(k))
            .cloned()
            .collect();
        dropped.sort();
        for key in &dropped {
            self.entries.remove(key);
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Every cached series, sorted by key.
    pub fn series(&self) -> Vec<Arc<IndicatorSeries>> {
        let mut keys: Vec<&PartitionKey> = self.entries.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|k| Arc::clone(&self.entries[k].series))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn prices(n: u32) -> Vec<PricePoint> {
        (1..=n)
            .map(|d| {
                PricePoint::at_close(
                    "ORCL",
                    NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                    100.0 + d as f64,
                )
            })
            .collect()
    }

    #[test]
    fn unchanged_history_is_a_hit() {
        let engine = IndicatorEngine::default();
        let key = PartitionKey::symbol("ORCL");
        let mut cache = SeriesCache::new();

        let first = cache.get_or_compute(&engine, &key, &prices(20), &[]).unwrap();
        let second = cache.get_or_compute(&engine, &key, &prices(20), &[]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn appended_history_recomputes() {
        let engine = IndicatorEngine::default();
        let key = PartitionKey::symbol("ORCL");
        let mut cache = SeriesCache::new();

        let before = cache.get_or_compute(&engine, &key, &prices(20), &[]).unwrap();
        let after = cache.get_or_compute(&engine, &key, &prices(21), &[]).unwrap();
        assert_eq!(before.len(), 20);
        assert_eq!(after.len(), 21);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_and_retain() {
        let engine = IndicatorEngine::default();
        let mut cache = SeriesCache::new();
        let orcl = PartitionKey::symbol("ORCL");
        cache.get_or_compute(&engine, &orcl, &prices(5), &[]).unwrap();
        assert!(cache.get(&orcl).is_some());

        assert_eq!(cache.retain(|k| k.symbol != "ORCL"), vec![orcl.clone()]);
        assert!(cache.is_empty());
        assert!(!cache.invalidate(&orcl));
    }

    #[test]
    fn empty_partition_is_not_cached() {
        let engine = IndicatorEngine::default();
        let mut cache = SeriesCache::new();
        let result = cache.get_or_compute(&engine, &PartitionKey::symbol("NONE"), &[], &[]);
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
