use std::{env::var, time::Duration};

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use market::Asset;

const DEFAULT_INGEST_CRON: &str = "0 0 * * * *";
const DEFAULT_REPORT_CRON: &str = "0 5 0 * * *";

#[derive(Clone, Debug)]
pub struct Config {
    pub assets: Vec<Asset>,
    pub ingest_cron: String,
    pub report_cron: String,
    pub timezone: Tz,
    pub ticker_every: Duration,
    pub report_days: usize,
    pub correlation_days: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let assets = match get("SENTINEL_ASSETS") {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::parse::<Asset>)
                .collect::<Result<Vec<_>, _>>()
                .context("SENTINEL_ASSETS")?,
            _ => Asset::ALL.to_vec(),
        };

        let timezone = match get("SENTINEL_TZ") {
            Some(raw) => raw
                .parse::<Tz>()
                .map_err(|e| anyhow!("invalid SENTINEL_TZ {raw:?}: {e}"))?,
            None => Tz::UTC,
        };

        let number = |key: &str, default: u64| -> Result<u64> {
            get(key).map_or(Ok(default), |raw| {
                raw.trim().parse().with_context(|| format!("{key} must be a number"))
            })
        };

        Ok(Self {
            assets,
            ingest_cron: get("SENTINEL_INGEST_CRON").unwrap_or_else(|| DEFAULT_INGEST_CRON.into()),
            report_cron: get("SENTINEL_REPORT_CRON").unwrap_or_else(|| DEFAULT_REPORT_CRON.into()),
            timezone,
            ticker_every: Duration::from_secs(number("SENTINEL_TICKER_SECS", 60)?.max(1)),
            report_days: number("SENTINEL_REPORT_DAYS", 365)? as usize,
            correlation_days: number("SENTINEL_CORRELATION_DAYS", 90)? as usize,
        })
    }
}
