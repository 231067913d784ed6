//! Symbol-universe resolution: a built-in S&P 500 sample (top-20 plus
//! bottom-20 by market cap) that an `INGEST_SYMBOLS_FILE` override can
//! replace. Any problem with the override file falls back to the built-in
//! list with a warning; it never aborts the run.

use serde_json::Value;
use snapshot_core::StockSymbol;
use std::collections::HashSet;
use std::path::Path;

/// (symbol, name, displaySymbol, exchange)
const DEFAULT_UNIVERSE: &[(&str, &str, &str, &str)] = &[
    // Top 20 S&P 500 by market cap
    ("AAPL", "Apple Inc.", "NASDAQ:AAPL", "NASDAQ"),
    ("MSFT", "Microsoft Corporation", "NASDAQ:MSFT", "NASDAQ"),
    ("GOOGL", "Alphabet Inc.", "NASDAQ:GOOGL", "NASDAQ"),
    ("AMZN", "Amazon.com Inc.", "NASDAQ:AMZN", "NASDAQ"),
    ("NVDA", "NVIDIA Corporation", "NASDAQ:NVDA", "NASDAQ"),
    ("META", "Meta Platforms Inc.", "NASDAQ:META", "NASDAQ"),
    ("TSLA", "Tesla Inc.", "NASDAQ:TSLA", "NASDAQ"),
    ("BRK.B", "Berkshire Hathaway Inc.", "NYSE:BRK.B", "NYSE"),
    ("LLY", "Eli Lilly and Company", "NYSE:LLY", "NYSE"),
    ("V", "Visa Inc.", "NYSE:V", "NYSE"),
    ("UNH", "UnitedHealth Group Inc.", "NYSE:UNH", "NYSE"),
    ("XOM", "Exxon Mobil Corporation", "NYSE:XOM", "NYSE"),
    ("JPM", "JPMorgan Chase & Co.", "NYSE:JPM", "NYSE"),
    ("JNJ", "Johnson & Johnson", "NYSE:JNJ", "NYSE"),
    ("WMT", "Walmart Inc.", "NYSE:WMT", "NYSE"),
    ("PG", "Procter & Gamble Co.", "NYSE:PG", "NYSE"),
    ("MA", "Mastercard Inc.", "NYSE:MA", "NYSE"),
    ("HD", "The Home Depot Inc.", "NYSE:HD", "NYSE"),
    ("CVX", "Chevron Corporation", "NYSE:CVX", "NYSE"),
    ("AVGO", "Broadcom Inc.", "NASDAQ:AVGO", "NASDAQ"),
    // Bottom 20 S&P 500 by market cap
    ("NWL", "Newell Brands Inc.", "NASDAQ:NWL", "NASDAQ"),
    ("FMC", "FMC Corporation", "NYSE:FMC", "NYSE"),
    ("ALK", "Alaska Air Group Inc.", "NYSE:ALK", "NYSE"),
    ("HII", "Huntington Ingalls Industries", "NYSE:HII", "NYSE"),
    ("NWSA", "News Corporation", "NASDAQ:NWSA", "NASDAQ"),
    ("PARA", "Paramount Global", "NASDAQ:PARA", "NASDAQ"),
    ("MOS", "The Mosaic Company", "NYSE:MOS", "NYSE"),
    ("AIZ", "Assurant Inc.", "NYSE:AIZ", "NYSE"),
    ("TPR", "Tapestry Inc.", "NYSE:TPR", "NYSE"),
    ("ZION", "Zions Bancorporation", "NASDAQ:ZION", "NASDAQ"),
    ("REG", "Regency Centers Corporation", "NASDAQ:REG", "NASDAQ"),
    ("BEN", "Franklin Resources Inc.", "NYSE:BEN", "NYSE"),
    ("IVZ", "Invesco Ltd.", "NYSE:IVZ", "NYSE"),
    ("GL", "Globe Life Inc.", "NYSE:GL", "NYSE"),
    ("VFC", "V.F. Corporation", "NYSE:VFC", "NYSE"),
    ("BWA", "BorgWarner Inc.", "NYSE:BWA", "NYSE"),
    ("NCLH", "Norwegian Cruise Line Holdings", "NYSE:NCLH", "NYSE"),
    ("CRL", "Charles River Laboratories", "NYSE:CRL", "NYSE"),
    ("GNRC", "Generac Holdings Inc.", "NYSE:GNRC", "NYSE"),
    ("WBD", "Warner Bros. Discovery Inc.", "NASDAQ:WBD", "NASDAQ"),
];

/// The built-in fallback universe.
pub fn default_symbols() -> Vec<StockSymbol> {
    DEFAULT_UNIVERSE
        .iter()
        .map(|&(symbol, name, display_symbol, exchange)| StockSymbol {
            symbol: symbol.to_string(),
            name: name.to_string(),
            description: name.to_string(),
            display_symbol: display_symbol.to_string(),
            security_type: "Common Stock".to_string(),
            exchange: exchange.to_string(),
        })
        .collect()
}

/// Normalize one parsed entry into a descriptor. Bare strings become
/// descriptors filled from the ticker; objects must carry a non-empty
/// `symbol`. Symbols are trimmed and uppercased either way.
fn normalize_entry(entry: &Value) -> Option<StockSymbol> {
    if let Some(s) = entry.as_str() {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        return Some(StockSymbol::from_bare_symbol(s));
    }

    let obj = entry.as_object()?;
    let symbol = obj.get("symbol")?.as_str()?.trim().to_uppercase();
    if symbol.is_empty() {
        return None;
    }
    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| symbol.clone())
    };
    Some(StockSymbol {
        name: field("name"),
        description: field("description"),
        display_symbol: field("displaySymbol"),
        security_type: obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("Equity")
            .to_string(),
        exchange: obj
            .get("exchange")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string(),
        symbol,
    })
}

/// Drop every entry whose symbol already appeared earlier in the list.
fn dedup_by_symbol(stocks: Vec<StockSymbol>) -> Vec<StockSymbol> {
    let mut seen = HashSet::new();
    stocks
        .into_iter()
        .filter(|stock| seen.insert(stock.symbol.clone()))
        .collect()
}

fn parse_symbols_file(path: &Path, raw: &str) -> Option<Vec<StockSymbol>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let entries: Vec<Value> = if is_json {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!("Symbols file {} is JSON but not an array", path.display());
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to parse symbols file {}: {}", path.display(), e);
                return None;
            }
        }
    } else {
        raw.split(['\n', '\r', ','])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect()
    };

    let normalized = dedup_by_symbol(entries.iter().filter_map(normalize_entry).collect());
    if normalized.is_empty() {
        tracing::warn!("Symbols file {} empty after parsing", path.display());
        return None;
    }
    Some(normalized)
}

/// Resolve the run's symbol list: the configured override file when it
/// reads, parses, and normalizes to at least one entry; the built-in list
/// otherwise.
pub fn resolve_symbols(symbols_file: Option<&Path>) -> Vec<StockSymbol> {
    let Some(path) = symbols_file else {
        return default_symbols();
    };

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                "Symbols file missing ({}); falling back to built-in list: {}",
                path.display(),
                e
            );
            return default_symbols();
        }
    };

    match parse_symbols_file(path, &raw) {
        Some(stocks) => stocks,
        None => {
            tracing::warn!("Falling back to built-in symbol list");
            default_symbols()
        }
    }
}
