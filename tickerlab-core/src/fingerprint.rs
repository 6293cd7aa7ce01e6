//! History fingerprints.
//!
//! A fingerprint is a BLAKE3 hash over one partition's canonical history
//! (prices in date order, then earnings in fiscal-date order) plus every
//! config field that affects the output. Equal fingerprints mean the computed
//! series would be bitwise equal, so a cached series can be reused.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::IndicatorConfig;
use crate::domain::{EarningsPoint, PartitionKey, PricePoint, ReportPeriod};
use crate::indicators::SeedRule;
use crate::partition::Dated;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HistoryFingerprint(String);

impl HistoryFingerprint {
    /// Fingerprint one partition. Inputs may be unordered; they are hashed
    /// in stable date order, the same order the engine computes over.
    pub fn compute(
        key: &PartitionKey,
        prices: &[PricePoint],
        earnings: &[EarningsPoint],
        config: &IndicatorConfig,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();

        hasher.update(key.symbol.as_bytes());
        hasher.update(&[0]);
        if let Some(exchange) = &key.exchange {
            hasher.update(exchange.as_bytes());
        }
        hasher.update(&[0]);
        hash_config(&mut hasher, config);

        let mut prices: Vec<&PricePoint> = prices.iter().collect();
        prices.sort_by_key(|p| p.date());
        hasher.update(&(prices.len() as u64).to_le_bytes());
        for p in prices {
            hasher.update(p.date.to_string().as_bytes());
            hasher.update(&p.close.to_bits().to_le_bytes());
        }

        let mut earnings: Vec<&EarningsPoint> = earnings.iter().collect();
        earnings.sort_by_key(|e| e.date());
        hasher.update(&(earnings.len() as u64).to_le_bytes());
        for e in earnings {
            hasher.update(e.fiscal_date_ending.to_string().as_bytes());
            hasher.update(match e.period {
                ReportPeriod::Quarterly => b"q",
                ReportPeriod::Annual => b"a",
            });
            match e.reported_eps {
                Some(eps) => hasher.update(&eps.to_bits().to_le_bytes()),
                None => hasher.update(b"none"),
            };
        }

        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn hash_config(hasher: &mut blake3::Hasher, config: &IndicatorConfig) {
    hasher.update(&(config.sma_windows.len() as u64).to_le_bytes());
    for w in &config.sma_windows {
        hasher.update(&(*w as u64).to_le_bytes());
    }
    hasher.update(&(config.rsi_period as u64).to_le_bytes());
    hasher.update(&(config.macd.fast as u64).to_le_bytes());
    hasher.update(&(config.macd.slow as u64).to_le_bytes());
    hasher.update(&(config.macd.signal as u64).to_le_bytes());
    hasher.update(match config.macd.signal_seed {
        SeedRule::Mean => b"mean",
        SeedRule::Last => b"last",
    });
    hasher.update(&(config.ttm_quarters as u64).to_le_bytes());
    match config.recurrence_window_days {
        Some(days) => hasher.update(&u64::from(days).to_le_bytes()),
        None => hasher.update(b"full"),
    };
}
