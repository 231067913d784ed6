//! The batch run: a fixed pool of workers racing over a shared cursor,
//! fetching quote then profile per symbol with linear-backoff retries,
//! writing raw per-symbol snapshots as they complete, and a hot-cache file
//! plus run manifest at the end.

use crate::config::FetcherConfig;
use crate::symbols;
use chrono::Utc;
use finnhub_client::FinnhubClient;
use serde::Serialize;
use snapshot_core::{
    profile_is_valid, quote_is_valid, ErrorEntry, ErrorKind, FetchKind, HotCache, RawSnapshot,
    RunManifest, SnapshotError, StockSymbol,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Sleep inserted before attempt `completed + 1`: the backoff grows
/// linearly (delay, 2×delay, 3×delay, ...).
pub fn backoff_delay(retry_delay_ms: u64, completed_attempts: u32) -> Duration {
    Duration::from_millis(retry_delay_ms.saturating_mul(completed_attempts as u64))
}

fn record_error(
    errors: &Mutex<Vec<ErrorEntry>>,
    symbol: &str,
    kind: ErrorKind,
    attempt: Option<u32>,
    reason: impl Into<String>,
) {
    errors.lock().unwrap().push(ErrorEntry {
        symbol: symbol.to_string(),
        kind,
        attempt,
        reason: reason.into(),
    });
}

/// Fetch one payload with up to `retries + 1` attempts. An attempt fails on
/// a transport/HTTP error or on an invalid payload (quote without a positive
/// price, empty profile object); both cases land in the error log the same
/// way. Returns the first valid payload, or `None` once attempts run out.
async fn fetch_with_retry(
    client: &FinnhubClient,
    kind: FetchKind,
    symbol: &str,
    retries: u32,
    retry_delay_ms: u64,
    errors: &Mutex<Vec<ErrorEntry>>,
) -> Option<Value> {
    for attempt in 1..=retries + 1 {
        let result = match kind {
            FetchKind::Quote => client.get_quote(symbol).await,
            FetchKind::Profile => client.get_profile(symbol).await,
        };

        match result {
            Ok(payload) => {
                let valid = match kind {
                    FetchKind::Quote => quote_is_valid(&payload),
                    FetchKind::Profile => profile_is_valid(&payload),
                };
                if valid {
                    return Some(payload);
                }
                tracing::warn!("{} empty for {} (attempt {})", kind, symbol, attempt);
                record_error(errors, symbol, kind.into(), Some(attempt), "empty response");
            }
            Err(e) => {
                tracing::warn!("{} error for {} (attempt {}): {}", kind, symbol, attempt, e);
                record_error(errors, symbol, kind.into(), Some(attempt), e.to_string());
            }
        }

        if attempt <= retries {
            tokio::time::sleep(backoff_delay(retry_delay_ms, attempt)).await;
        }
    }

    None
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), SnapshotError> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body)?;
    Ok(())
}

struct RunState {
    stocks: Vec<StockSymbol>,
    cursor: AtomicUsize,
    quotes: Mutex<BTreeMap<String, Value>>,
    profiles: Mutex<BTreeMap<String, Value>>,
    errors: Mutex<Vec<ErrorEntry>>,
    raw_dir: PathBuf,
}

async fn worker(worker_id: usize, client: FinnhubClient, config: FetcherConfig, state: Arc<RunState>) {
    loop {
        // Work-stealing claim: worker count bounds parallelism, not
        // assignment.
        let index = state.cursor.fetch_add(1, Ordering::SeqCst);
        let Some(stock) = state.stocks.get(index) else {
            return;
        };
        let symbol = stock.symbol.clone();
        tracing::debug!("Worker {} fetching {}...", worker_id, symbol);

        // Quote before profile, sequentially, to avoid bursts against one
        // symbol.
        let quote = fetch_with_retry(
            &client,
            FetchKind::Quote,
            &symbol,
            config.retries,
            config.retry_delay_ms,
            &state.errors,
        )
        .await;
        let profile = fetch_with_retry(
            &client,
            FetchKind::Profile,
            &symbol,
            config.retries,
            config.retry_delay_ms,
            &state.errors,
        )
        .await;

        match &quote {
            Some(q) => {
                state.quotes.lock().unwrap().insert(symbol.clone(), q.clone());
            }
            None => record_error(
                &state.errors,
                &symbol,
                ErrorKind::Quote,
                None,
                "missing after retries",
            ),
        }
        match &profile {
            Some(p) => {
                state.profiles.lock().unwrap().insert(symbol.clone(), p.clone());
            }
            None => record_error(
                &state.errors,
                &symbol,
                ErrorKind::Profile,
                None,
                "missing after retries",
            ),
        }

        let raw_path = state.raw_dir.join(format!("{symbol}.json"));
        if let Err(e) = write_json(&raw_path, &RawSnapshot { quote, profile }) {
            tracing::warn!("Failed to write {}: {}", raw_path.display(), e);
            record_error(&state.errors, &symbol, ErrorKind::Write, None, e.to_string());
        }

        if config.pace_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.pace_delay_ms)).await;
        }
    }
}

/// One full pass over the resolved symbol list. Always completes and always
/// returns a manifest unless something unexpected (directory creation, the
/// final hot-cache/manifest writes) fails; per-symbol failures only end up
/// in the error log.
pub async fn run(config: &FetcherConfig) -> Result<RunManifest, SnapshotError> {
    let start = Instant::now();
    let date = Utc::now().format("%Y-%m-%d").to_string();

    let stocks = symbols::resolve_symbols(config.symbols_file.as_deref());
    tracing::info!(
        "Starting daily fetch for {} symbols on {} (concurrency={}, retries={})",
        stocks.len(),
        date,
        config.concurrency,
        config.retries
    );

    let raw_dir = config.data_dir.join("raw").join(&date);
    let hot_dir = config.data_dir.join("hot");
    std::fs::create_dir_all(&raw_dir)?;
    std::fs::create_dir_all(&hot_dir)?;

    let mut client = FinnhubClient::new(config.api_key.clone(), config.allow_insecure_ssl)?;
    if let Some(base_url) = &config.base_url {
        client = client.with_base_url(base_url.clone());
    }

    let state = Arc::new(RunState {
        stocks,
        cursor: AtomicUsize::new(0),
        quotes: Mutex::new(BTreeMap::new()),
        profiles: Mutex::new(BTreeMap::new()),
        errors: Mutex::new(Vec::new()),
        raw_dir,
    });

    let worker_count = config.concurrency.max(1);
    let mut handles = Vec::with_capacity(worker_count);
    for worker_id in 1..=worker_count {
        handles.push(tokio::spawn(worker(
            worker_id,
            client.clone(),
            config.clone(),
            Arc::clone(&state),
        )));
    }
    // Full barrier: nothing below runs until every worker drained its share
    // of the queue.
    for handle in handles {
        let _ = handle.await;
    }

    let state = Arc::into_inner(state).expect("workers have exited");
    let quotes = state.quotes.into_inner().unwrap();
    let profiles = state.profiles.into_inner().unwrap();
    let errors = state.errors.into_inner().unwrap();

    let hot_cache = HotCache {
        sample_stocks: state.stocks.clone(),
        mock_stock_quotes: quotes,
        mock_company_profiles: profiles,
        fetched_at: Utc::now(),
    };
    write_json(&hot_dir.join("hotCache.json"), &hot_cache)?;

    let manifest = RunManifest {
        date,
        symbols: state.stocks.len(),
        quotes: hot_cache.mock_stock_quotes.len(),
        profiles: hot_cache.mock_company_profiles.len(),
        errors,
        generated_at: Utc::now(),
        symbol_source: config
            .symbols_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "builtin".to_string()),
        allow_insecure_ssl: config.allow_insecure_ssl,
        concurrency: config.concurrency,
        retries: config.retries,
        retry_delay_ms: config.retry_delay_ms,
        pace_delay_ms: config.pace_delay_ms,
        run_ms: start.elapsed().as_millis() as u64,
    };
    write_json(&config.data_dir.join("manifest.json"), &manifest)?;

    Ok(manifest)
}
