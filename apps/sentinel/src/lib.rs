use market::{CoinGeckoClient, IngestConfig, RestTable};

pub mod config;

/// Clients shared by the scheduled jobs.
pub struct Services {
    pub remote: RestTable,
    pub coingecko: CoinGeckoClient,
    pub ingest: IngestConfig,
}

pub type Error = anyhow::Error;
