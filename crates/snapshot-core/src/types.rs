use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry of the symbol universe, in the shape the dashboard front-end
/// expects (`displaySymbol`, `type` etc. are part of the on-disk contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSymbol {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub display_symbol: String,
    #[serde(rename = "type")]
    pub security_type: String,
    pub exchange: String,
}

impl StockSymbol {
    /// Build a descriptor from a bare ticker string. Everything except the
    /// type/exchange placeholders is filled from the symbol itself.
    pub fn from_bare_symbol(symbol: &str) -> Self {
        let symbol = symbol.trim().to_uppercase();
        Self {
            name: symbol.clone(),
            description: symbol.clone(),
            display_symbol: symbol.clone(),
            security_type: "Equity".to_string(),
            exchange: "UNKNOWN".to_string(),
            symbol,
        }
    }
}

/// Which of the two remote endpoints a fetch targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchKind {
    Quote,
    Profile,
}

impl std::fmt::Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchKind::Quote => write!(f, "quote"),
            FetchKind::Profile => write!(f, "profile"),
        }
    }
}

/// What a recorded failure was about: one of the two fetch targets, or a
/// raw-snapshot file write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Quote,
    Profile,
    Write,
}

impl From<FetchKind> for ErrorKind {
    fn from(kind: FetchKind) -> Self {
        match kind {
            FetchKind::Quote => ErrorKind::Quote,
            FetchKind::Profile => ErrorKind::Profile,
        }
    }
}

/// One recorded failure. `attempt` is `None` for the final
/// "missing after retries" entry written once per exhausted symbol, and for
/// file-write failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub symbol: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    pub reason: String,
}

/// Per-symbol raw snapshot, written as soon as both sub-fetches resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub quote: Option<Value>,
    pub profile: Option<Value>,
}

/// The aggregate artifact the front-end loads instead of calling the API.
/// Only symbols whose payloads passed validation appear in the maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotCache {
    pub sample_stocks: Vec<StockSymbol>,
    pub mock_stock_quotes: BTreeMap<String, Value>,
    pub mock_company_profiles: BTreeMap<String, Value>,
    pub fetched_at: DateTime<Utc>,
}

/// Per-run summary: counts, the full error log, and the configuration the
/// run actually used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub date: String,
    pub symbols: usize,
    pub quotes: usize,
    pub profiles: usize,
    pub errors: Vec<ErrorEntry>,
    pub generated_at: DateTime<Utc>,
    pub symbol_source: String,
    pub allow_insecure_ssl: bool,
    pub concurrency: usize,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub pace_delay_ms: u64,
    pub run_ms: u64,
}

/// A quote is usable iff its current price (`c`) is a positive number.
/// Finnhub returns `{"c": 0, ...}` for unknown symbols rather than an error.
pub fn quote_is_valid(quote: &Value) -> bool {
    quote
        .get("c")
        .and_then(Value::as_f64)
        .is_some_and(|c| c > 0.0)
}

/// A profile is usable iff it is a JSON object with at least one key.
pub fn profile_is_valid(profile: &Value) -> bool {
    profile.as_object().is_some_and(|obj| !obj.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_validity_requires_positive_price() {
        assert!(quote_is_valid(&json!({"c": 230.45, "pc": 225.6})));
        assert!(!quote_is_valid(&json!({"c": 0})));
        assert!(!quote_is_valid(&json!({"c": -1.5})));
        assert!(!quote_is_valid(&json!({"pc": 225.6})));
        assert!(!quote_is_valid(&json!({"c": "230.45"})));
        assert!(!quote_is_valid(&json!(null)));
    }

    #[test]
    fn profile_validity_requires_nonempty_object() {
        assert!(profile_is_valid(&json!({"name": "Apple Inc"})));
        assert!(!profile_is_valid(&json!({})));
        assert!(!profile_is_valid(&json!([])));
        assert!(!profile_is_valid(&json!(null)));
    }

    #[test]
    fn bare_symbol_is_trimmed_and_uppercased() {
        let stock = StockSymbol::from_bare_symbol(" aapl ");
        assert_eq!(stock.symbol, "AAPL");
        assert_eq!(stock.name, "AAPL");
        assert_eq!(stock.security_type, "Equity");
        assert_eq!(stock.exchange, "UNKNOWN");
    }

    #[test]
    fn hot_cache_serializes_with_frontend_field_names() {
        let cache = HotCache {
            sample_stocks: vec![StockSymbol::from_bare_symbol("AAPL")],
            mock_stock_quotes: BTreeMap::new(),
            mock_company_profiles: BTreeMap::new(),
            fetched_at: Utc::now(),
        };
        let value = serde_json::to_value(&cache).unwrap();
        assert!(value.get("sampleStocks").is_some());
        assert!(value.get("mockStockQuotes").is_some());
        assert!(value.get("mockCompanyProfiles").is_some());
        assert!(value.get("fetchedAt").is_some());
        assert_eq!(value["sampleStocks"][0]["displaySymbol"], "AAPL");
        assert_eq!(value["sampleStocks"][0]["type"], "Equity");
    }

    #[test]
    fn manifest_serializes_camel_case() {
        let manifest = RunManifest {
            date: "2026-08-28".to_string(),
            symbols: 1,
            quotes: 1,
            profiles: 0,
            errors: vec![ErrorEntry {
                symbol: "AAPL".to_string(),
                kind: ErrorKind::Profile,
                attempt: None,
                reason: "missing after retries".to_string(),
            }],
            generated_at: Utc::now(),
            symbol_source: "sampleData".to_string(),
            allow_insecure_ssl: false,
            concurrency: 4,
            retries: 2,
            retry_delay_ms: 750,
            pace_delay_ms: 400,
            run_ms: 1234,
        };
        let value = serde_json::to_value(&manifest).unwrap();
        assert!(value.get("retryDelayMs").is_some());
        assert!(value.get("allowInsecureSsl").is_some());
        assert_eq!(value["errors"][0]["kind"], "profile");
        assert!(value["errors"][0].get("attempt").is_none());
    }
}
