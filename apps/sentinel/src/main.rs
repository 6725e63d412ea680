use std::sync::Arc;

use anyhow::Result;
use market::{CoinGeckoClient, IngestConfig, RemoteConfig, RestTable, Ticker};
use sentinel::{Services, config::Config};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod ingest;
mod report;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let ingest_config = IngestConfig::from_env()?;

    let services = Arc::new(Services {
        remote: RestTable::new(&RemoteConfig::from_env()?)?,
        coingecko: CoinGeckoClient::new(&ingest_config)?,
        ingest: ingest_config,
    });
    info!(
        assets = ?config.assets,
        tz = %config.timezone,
        ingest_cron = %config.ingest_cron,
        report_cron = %config.report_cron,
        "sentinel starting"
    );

    let ticker = Arc::new(Ticker::new(services.remote.clone(), config.assets.clone()));
    tokio::spawn(Arc::clone(&ticker).run(config.ticker_every));

    let sched = JobScheduler::new().await?;

    let services_job = Arc::clone(&services);
    let assets_job = config.assets.clone();
    sched
        .add(Job::new_async_tz(
            config.ingest_cron.as_str(),
            config.timezone,
            move |_uuid, _l| {
                let services = Arc::clone(&services_job);
                let assets = assets_job.clone();

                Box::pin(async move {
                    if let Err(e) = ingest::run_ingest(services, assets).await {
                        error!("run_ingest failed: {:?}", e);
                    }
                })
            },
        )?)
        .await?;

    let services_job = Arc::clone(&services);
    let assets_job = config.assets.clone();
    let (report_days, correlation_days) = (config.report_days, config.correlation_days);
    sched
        .add(Job::new_async_tz(
            config.report_cron.as_str(),
            config.timezone,
            move |_uuid, _l| {
                let services = Arc::clone(&services_job);
                let assets = assets_job.clone();

                Box::pin(async move {
                    if let Err(e) =
                        report::run_report(services, assets, report_days, correlation_days).await
                    {
                        error!("run_report failed: {:?}", e);
                    }
                })
            },
        )?)
        .await?;

    sched.shutdown_on_ctrl_c();
    sched.start().await?;

    shutdown_signal().await?;

    let board = ticker.items();
    info!(tickers = board.len(), "Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}
