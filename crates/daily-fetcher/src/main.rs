//! daily-fetcher: pre-fetch quotes and company profiles for the dashboard.
//!
//! Writes `data/raw/<date>/<SYMBOL>.json` per symbol plus the aggregated
//! `data/hot/hotCache.json` and `data/manifest.json` the front-end serves
//! instead of calling the market-data API live.
//!
//! Usage:
//!   FINNHUB_API_KEY=... cargo run -p daily-fetcher
//!
//! Tunables (environment): INGEST_CONCURRENCY, INGEST_RETRIES,
//! INGEST_RETRY_DELAY_MS, INGEST_PACE_DELAY_MS, INGEST_SYMBOLS_FILE,
//! INGEST_DATA_DIR, ALLOW_INSECURE_SSL.

use daily_fetcher::{fetch, FetcherConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_fetcher=info,finnhub_client=warn".into()),
        )
        .init();

    let config = FetcherConfig::from_env()?;
    let manifest = fetch::run(&config).await?;

    tracing::info!(
        "Done. Quotes: {}, Profiles: {}, Errors: {}",
        manifest.quotes,
        manifest.profiles,
        manifest.errors.len()
    );
    Ok(())
}
