//! Domain types for tickerlab

pub mod earnings;
pub mod key;
pub mod price;

pub use earnings::{
    parse_reported_eps, EarningsPoint, EarningsResponse, ProviderReport, ReportPeriod,
};
pub use key::{PartitionBy, PartitionKey};
pub use price::PricePoint;
