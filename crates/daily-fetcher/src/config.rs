use snapshot_core::SnapshotError;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 750;
const DEFAULT_PACE_DELAY_MS: u64 = 400;
const DEFAULT_DATA_DIR: &str = "data";

/// All tunables for one batch run. Everything is overridable via
/// environment; `api_key` is the only required value.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub api_key: String,
    pub allow_insecure_ssl: bool,
    pub symbols_file: Option<PathBuf>,
    pub concurrency: usize,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub pace_delay_ms: u64,
    pub data_dir: PathBuf,
    pub base_url: Option<String>,
}

impl FetcherConfig {
    /// Defaults with just the API key set.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            allow_insecure_ssl: false,
            symbols_file: None,
            concurrency: DEFAULT_CONCURRENCY,
            retries: DEFAULT_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            pace_delay_ms: DEFAULT_PACE_DELAY_MS,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            base_url: None,
        }
    }

    /// Read configuration from the environment. A missing `FINNHUB_API_KEY`
    /// is the one fatal case; unparsable numeric overrides fall back to
    /// their defaults with a warning.
    pub fn from_env() -> Result<Self, SnapshotError> {
        let api_key = std::env::var("FINNHUB_API_KEY").map_err(|_| {
            SnapshotError::ConfigError(
                "FINNHUB_API_KEY environment variable is required (set it in .env or the environment)"
                    .to_string(),
            )
        })?;

        let mut config = Self::new(api_key);
        config.allow_insecure_ssl =
            std::env::var("ALLOW_INSECURE_SSL").is_ok_and(|v| v == "true");
        config.symbols_file = std::env::var("INGEST_SYMBOLS_FILE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        config.concurrency = env_parse("INGEST_CONCURRENCY", DEFAULT_CONCURRENCY);
        config.retries = env_parse("INGEST_RETRIES", DEFAULT_RETRIES);
        config.retry_delay_ms = env_parse("INGEST_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS);
        config.pace_delay_ms = env_parse("INGEST_PACE_DELAY_MS", DEFAULT_PACE_DELAY_MS);
        if let Ok(dir) = std::env::var("INGEST_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.base_url = std::env::var("FINNHUB_BASE_URL").ok();

        Ok(config)
    }
}

fn env_parse<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={:?}, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
