//! Partition keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PricePoint;

/// Which fields of a price point identify its partition.
///
/// A symbol can be cross-listed, so keying by symbol alone merges listings
/// that trade on different exchanges. `SymbolExchange` keeps them apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionBy {
    #[default]
    Symbol,
    SymbolExchange,
}

/// Grouping key of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

impl PartitionKey {
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: None,
        }
    }

    pub fn listing(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: Some(exchange.into()),
        }
    }

    /// Key of a price point under the given partitioning.
    pub fn of(point: &PricePoint, by: PartitionBy) -> Self {
        match by {
            PartitionBy::Symbol => Self::symbol(point.symbol.clone()),
            PartitionBy::SymbolExchange => Self {
                symbol: point.symbol.clone(),
                exchange: point.exchange.clone(),
            },
        }
    }

    /// True if the price point belongs to this partition under `by`.
    pub fn matches(&self, point: &PricePoint, by: PartitionBy) -> bool {
        point.symbol == self.symbol
            && match by {
                PartitionBy::Symbol => true,
                PartitionBy::SymbolExchange => point.exchange == self.exchange,
            }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.exchange {
            Some(exchange) => write!(f, "{}:{}", exchange, self.symbol),
            None => write!(f, "{}", self.symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(symbol: &str, exchange: Option<&str>) -> PricePoint {
        PricePoint {
            symbol: symbol.into(),
            exchange: exchange.map(String::from),
            date: NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
        }
    }

    #[test]
    fn symbol_partitioning_ignores_exchange() {
        let p = point("SHOP", Some("NYSE"));
        let key = PartitionKey::of(&p, PartitionBy::Symbol);
        assert_eq!(key, PartitionKey::symbol("SHOP"));
        assert!(key.matches(&point("SHOP", Some("TSX")), PartitionBy::Symbol));
    }

    #[test]
    fn listing_partitioning_separates_exchanges() {
        let key = PartitionKey::listing("SHOP", "NYSE");
        assert!(key.matches(&point("SHOP", Some("NYSE")), PartitionBy::SymbolExchange));
        assert!(!key.matches(&point("SHOP", Some("TSX")), PartitionBy::SymbolExchange));
        assert!(!key.matches(&point("SHOP", None), PartitionBy::SymbolExchange));
    }

    #[test]
    fn display_prefixes_exchange() {
        assert_eq!(PartitionKey::listing("SHOP", "TSX").to_string(), "TSX:SHOP");
        assert_eq!(PartitionKey::symbol("SHOP").to_string(), "SHOP");
    }
}
