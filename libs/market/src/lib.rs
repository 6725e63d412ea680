mod error;

pub mod asset;
pub mod correlation;
pub mod indicators;
pub mod ingest;
pub mod point;
pub mod remote;
pub mod risk;
pub mod series;
pub mod summary;
pub mod sync;
pub mod synthetic;
pub mod ticker;

pub use asset::Asset;
pub use error::{MarketError, Result};
pub use ingest::{CoinGeckoClient, IngestConfig};
pub use point::PricePoint;
pub use remote::{RemoteConfig, RemoteTable, RestTable, WriteMode};
pub use series::SeriesStore;
pub use sync::{LoadRequest, SeriesSync};
pub use ticker::Ticker;
