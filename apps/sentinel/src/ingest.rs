use std::sync::Arc;

use anyhow::Result;
use futures_util::{StreamExt, stream};
use market::Asset;
use market::ingest::ingest_asset;
use sentinel::{Error, Services};

use tracing::{error, info, instrument, warn};
use tracing_futures::Instrument;

const CONCURRENCY: usize = 2;

#[instrument(
    name = "run_ingest",
    skip(services, assets),
    fields(assets = assets.len(), mode = ?services.ingest.mode)
)]
pub async fn run_ingest(services: Arc<Services>, assets: Vec<Asset>) -> Result<()> {
    let mut tasks = stream::iter(assets)
        .map(|asset| {
            let services = Arc::clone(&services);
            let span = tracing::info_span!("ingest_asset", asset = %asset);

            async move {
                match ingest_asset(&services.coingecko, &services.remote, asset, &services.ingest)
                    .await
                {
                    Ok(rows) => Ok::<usize, Error>(rows),
                    Err(e) if e.is_transport() => {
                        warn!(error = %e, "ingest skipped");
                        Ok(0)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            .instrument(span)
        })
        .buffer_unordered(CONCURRENCY);

    let mut processed: usize = 0;
    let mut written: usize = 0;
    let mut skipped: usize = 0;
    let mut failures: usize = 0;

    while let Some(res) = tasks.next().await {
        processed += 1;

        match res {
            Ok(0) => skipped += 1,
            Ok(rows) => written += rows,
            Err(e) => {
                failures += 1;
                error!(error = ?e, processed, "ingest task returned Err");
            }
        }
    }

    info!(processed, written, skipped, failures, "completed ingest run");
    Ok(())
}
