//! Multi-partition batch computation on a private rayon pool.
//!
//! Partitions are independent, so each one is computed on its own task with
//! no shared mutable state. Results are collected into key order, which makes
//! a parallel batch identical to a sequential one.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

use tickerlab_core::{
    EarningsPoint, HistoryFingerprint, IndicatorEngine, IndicatorSeries, PartitionError,
    PartitionKey, Partitioner, PricePoint, SeriesStore,
};

use crate::cache::SeriesCache;
use crate::config::RunnerConfig;
use crate::error::RunError;
use crate::table::IndicatorTable;

/// Output of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub series: BTreeMap<PartitionKey, IndicatorSeries>,
    /// Keys listed by the source that had no price points.
    pub skipped: Vec<PartitionKey>,
}

impl BatchResult {
    pub fn get(&self, key: &PartitionKey) -> Option<&IndicatorSeries> {
        self.series.get(key)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn into_table(self) -> IndicatorTable {
        IndicatorTable::from_series(self.series.into_values())
    }
}

/// What a cache refresh did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub recomputed: Vec<PartitionKey>,
    pub reused: usize,
    /// Cached keys the store no longer lists.
    pub evicted: Vec<PartitionKey>,
}

/// One partition's history, loaded and fingerprinted.
struct LoadedPartition {
    key: PartitionKey,
    prices: Vec<PricePoint>,
    earnings: Vec<EarningsPoint>,
    fingerprint: HistoryFingerprint,
}

pub struct BatchRunner {
    engine: IndicatorEngine,
    pool: rayon::ThreadPool,
}

impl BatchRunner {
    /// Build a runner with its own thread pool (not the global one).
    pub fn new(config: &RunnerConfig) -> Result<Self, RunError> {
        config.validate()?;
        let engine = IndicatorEngine::new(config.indicators.clone())?;
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("tickerlab-pool-{i}"));
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;
        Ok(Self { engine, pool })
    }

    pub fn engine(&self) -> &IndicatorEngine {
        &self.engine
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compute every partition present in `prices`.
    #[instrument(skip_all, fields(prices = prices.len(), earnings = earnings.len()))]
    pub fn run_points(&self, prices: &[PricePoint], earnings: &[EarningsPoint]) -> BatchResult {
        let partitioner: Partitioner = self.engine.partitioner();
        let price_partitions = partitioner.partition_prices(prices.iter().cloned());
        let earnings_partitions = partitioner.partition_earnings(earnings.iter().cloned());
        let no_earnings: &[EarningsPoint] = &[];

        let work: Vec<(&PartitionKey, &[PricePoint], &[EarningsPoint])> = price_partitions
            .iter()
            .map(|(key, partition)| {
                let reports = earnings_partitions
                    .get(&key.symbol)
                    .map_or(no_earnings, |p| p.points());
                (key, partition.points(), reports)
            })
            .collect();

        let computed: Vec<(PartitionKey, Result<IndicatorSeries, PartitionError>)> =
            self.pool.install(|| {
                work.par_iter()
                    .map(|(key, prices, earnings)| {
                        (
                            (*key).clone(),
                            self.engine.compute_series(key, prices, earnings),
                        )
                    })
                    .collect()
            });

        let result = collect(computed);
        info!(
            partitions = result.len(),
            skipped = result.skipped.len(),
            "batch complete"
        );
        result
    }

    /// Compute every partition the store lists.
    #[instrument(skip_all, fields(store = store.name()))]
    pub fn run_store(&self, store: &dyn SeriesStore) -> Result<BatchResult, RunError> {
        let by = self.engine.config().partition_by;
        let keys = store.keys(by)?;

        let computed: Vec<(PartitionKey, Result<IndicatorSeries, PartitionError>)> =
            self.pool.install(|| {
                keys.par_iter()
                    .map(|key| -> Result<_, RunError> {
                        let prices = store.prices(key, by)?;
                        let earnings = store.earnings(&key.symbol)?;
                        Ok((
                            key.clone(),
                            self.engine.compute_series(key, &prices, &earnings),
                        ))
                    })
                    .collect::<Result<Vec<_>, RunError>>()
            })?;

        let result = collect(computed);
        info!(
            partitions = result.len(),
            skipped = result.skipped.len(),
            "store batch complete"
        );
        Ok(result)
    }

    /// Bring `cache` up to date with `store`, recomputing only partitions
    /// whose history changed. Stale partitions are recomputed in parallel.
    #[instrument(skip_all, fields(store = store.name()))]
    pub fn refresh(
        &self,
        store: &dyn SeriesStore,
        cache: &mut SeriesCache,
    ) -> Result<RefreshSummary, RunError> {
        let by = self.engine.config().partition_by;
        let keys = store.keys(by)?;

        let loaded: Vec<LoadedPartition> = self.pool.install(|| {
            keys.par_iter()
                .map(|key| -> Result<_, RunError> {
                    let prices = store.prices(key, by)?;
                    let earnings = store.earnings(&key.symbol)?;
                    let fingerprint =
                        HistoryFingerprint::compute(key, &prices, &earnings, self.engine.config());
                    Ok(LoadedPartition {
                        key: key.clone(),
                        prices,
                        earnings,
                        fingerprint,
                    })
                })
                .collect::<Result<Vec<_>, RunError>>()
        })?;

        let mut summary = RefreshSummary::default();
        let stale: Vec<LoadedPartition> = loaded
            .into_iter()
            .filter(|p| {
                let fresh = cache.lookup(&p.key, &p.fingerprint).is_some();
                if fresh {
                    summary.reused += 1;
                }
                !fresh
            })
            .collect();

        let recomputed: Vec<(LoadedPartition, Result<IndicatorSeries, PartitionError>)> =
            self.pool.install(|| {
                stale
                    .into_par_iter()
                    .map(|p| {
                        let series = self.engine.compute_series(&p.key, &p.prices, &p.earnings);
                        (p, series)
                    })
                    .collect()
            });

        for (partition, series) in recomputed {
            match series {
                Ok(series) => {
                    debug!(key = %partition.key, points = series.len(), "recomputed");
                    summary.recomputed.push(partition.key.clone());
                    cache.insert(partition.key, partition.fingerprint, series);
                }
                Err(e) => {
                    warn!(key = %partition.key, error = %e, "partition skipped");
                    cache.invalidate(&partition.key);
                }
            }
        }

        let listed: BTreeSet<&PartitionKey> = keys.iter().collect();
        summary.evicted = cache.retain(|k| listed.contains(k));

        info!(
            recomputed = summary.recomputed.len(),
            reused = summary.reused,
            evicted = summary.evicted.len(),
            "cache refreshed"
        );
        Ok(summary)
    }

    /// Refresh `cache` from `store` and return the resulting table.
    pub fn refresh_table(
        &self,
        store: &dyn SeriesStore,
        cache: &mut SeriesCache,
    ) -> Result<IndicatorTable, RunError> {
        self.refresh(store, cache)?;
        Ok(IndicatorTable::from_shared(cache.series()))
    }
}

fn collect(computed: Vec<(PartitionKey, Result<IndicatorSeries, PartitionError>)>) -> BatchResult {
    let mut result = BatchResult::default();
    for (key, series) in computed {
        match series {
            Ok(series) => {
                result.series.insert(key, series);
            }
            Err(e) => {
                debug!(key = %key, error = %e, "partition skipped");
                result.skipped.push(key);
            }
        }
    }
    result
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("engine", &self.engine)
            .field("threads", &self.threads())
            .finish()
    }
}
