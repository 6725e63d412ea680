use anyhow::Error;
use reqwest::{
    Client, Response,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use tracing::{debug, instrument};

use super::{RemoteTable, TableQuery, WriteMode};
use crate::error::{MarketError, Result};
use crate::point::PricePoint;

/// Rows the store returns per request at most.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: String,
    pub key: String,
    pub page_size: usize,
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Expects SUPABASE_URL and SUPABASE_KEY; SUPABASE_PAGE_SIZE is optional.
    pub fn from_env() -> Result<Self, Error> {
        use std::env;

        let url = env::var("SUPABASE_URL")
            .map_err(|_| Error::msg("SUPABASE_URL environment variable not set"))?;
        let key = env::var("SUPABASE_KEY")
            .map_err(|_| Error::msg("SUPABASE_KEY environment variable not set"))?;

        let mut config = Self::new(url, key);
        if let Ok(raw) = env::var("SUPABASE_PAGE_SIZE") {
            config.page_size = raw.parse()?;
            anyhow::ensure!(config.page_size > 0, "SUPABASE_PAGE_SIZE must be positive");
        }
        Ok(config)
    }
}

/// REST client for the table store (PostgREST dialect).
#[derive(Clone)]
pub struct RestTable {
    client: Client,
    base_api: String,
    page_size: usize,
}

impl RestTable {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| MarketError::InvalidConfig(e.to_string());

        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&config.key).map_err(invalid)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.key)).map_err(invalid)?,
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_api: config.url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_api, table)
    }

    async fn check(res: Response) -> Result<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(MarketError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

fn query_params(query: &TableQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", "*".to_string()),
        ("order", "date.desc".to_string()),
    ];
    if let Some((from, to)) = query.range {
        params.push(("offset", from.to_string()));
        params.push(("limit", (to + 1 - from).to_string()));
    } else if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(from) = query.date_gte {
        params.push(("date", format!("gte.{from}")));
    }
    if let Some(to) = query.date_lte {
        params.push(("date", format!("lte.{to}")));
    }
    params
}

/// Conflict target and `Prefer` header for a keyed write.
fn write_params(mode: WriteMode) -> ([(&'static str, &'static str); 1], &'static str) {
    let prefer = match mode {
        WriteMode::Merge => "resolution=merge-duplicates,return=minimal",
        WriteMode::FillGaps => "resolution=ignore-duplicates,return=minimal",
    };
    ([("on_conflict", "date")], prefer)
}

impl RemoteTable for RestTable {
    fn page_size(&self) -> usize {
        self.page_size
    }

    #[instrument(name = "remote_fetch", skip(self), fields(table = %table))]
    async fn fetch(&self, table: &str, query: &TableQuery) -> Result<Vec<PricePoint>> {
        let res = self
            .client
            .get(self.table_url(table))
            .query(&query_params(query))
            .send()
            .await?;

        let body = Self::check(res).await?.text().await?;
        let rows: Vec<PricePoint> = serde_json::from_str(&body)
            .map_err(|e| MarketError::Malformed(format!("{table}: {e}")))?;

        debug!(rows = rows.len(), "fetched rows");
        Ok(rows)
    }

    #[instrument(name = "remote_upsert", skip(self, rows), fields(table = %table, rows = rows.len()))]
    async fn upsert(&self, table: &str, rows: &[PricePoint], mode: WriteMode) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let (params, prefer) = write_params(mode);

        let res = self
            .client
            .post(self.table_url(table))
            .query(&params)
            .header("Prefer", prefer)
            .json(rows)
            .send()
            .await?;

        Self::check(res).await?;
        debug!(?mode, "upserted rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn range_becomes_offset_and_limit() {
        let params = query_params(&TableQuery::default().page(1000, 1000));
        assert!(params.contains(&("offset", "1000".to_string())));
        assert!(params.contains(&("limit", "1000".to_string())));
        assert!(params.contains(&("order", "date.desc".to_string())));
    }

    #[test]
    fn date_bounds_are_inclusive_filters() {
        let q = TableQuery::between(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        );
        let params = query_params(&q);
        assert!(params.contains(&("date", "gte.2023-01-01".to_string())));
        assert!(params.contains(&("date", "lte.2023-12-31".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "limit"));
    }

    #[test]
    fn write_mode_selects_conflict_resolution() {
        let (params, prefer) = write_params(WriteMode::Merge);
        assert_eq!(params, [("on_conflict", "date")]);
        assert!(prefer.starts_with("resolution=merge-duplicates"));

        let (params, prefer) = write_params(WriteMode::FillGaps);
        assert_eq!(params, [("on_conflict", "date")]);
        assert!(prefer.starts_with("resolution=ignore-duplicates"));
        assert!(prefer.ends_with("return=minimal"));
    }

    #[test]
    fn client_pages_at_configured_size() {
        let mut config = RemoteConfig::new("https://example.test", "key");
        assert_eq!(RestTable::new(&config).unwrap().page_size(), DEFAULT_PAGE_SIZE);

        config.page_size = 250;
        assert_eq!(RestTable::new(&config).unwrap().page_size(), 250);
    }

    #[test]
    fn client_rejects_unprintable_key() {
        let config = RemoteConfig::new("https://example.test/", "bad\nkey");
        assert!(matches!(RestTable::new(&config), Err(MarketError::InvalidConfig(_))));
    }
}
