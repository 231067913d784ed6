use reqwest::Client;
use serde_json::Value;
use snapshot_core::SnapshotError;
use std::time::Duration;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Per-request timeout. Finnhub normally answers well under a second; a
/// stuck connection is treated as one failed attempt by the caller.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client for the two read-only Finnhub endpoints the snapshot job
/// consumes. Authentication is a `token` query parameter on every request.
#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl FinnhubClient {
    pub fn new(api_key: String, allow_insecure_ssl: bool) -> Result<Self, SnapshotError> {
        if allow_insecure_ssl {
            tracing::warn!("ALLOW_INSECURE_SSL enabled. TLS verification is disabled.");
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(allow_insecure_ssl)
            .build()
            .map_err(|e| SnapshotError::ApiError(e.to_string()))?;

        Ok(Self {
            api_key,
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host (mock server in tests, or a
    /// proxy in constrained environments).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get the current quote for a symbol. Returns the raw JSON body;
    /// validity (positive `c` field) is judged by the caller.
    pub async fn get_quote(&self, symbol: &str) -> Result<Value, SnapshotError> {
        self.get_json("/quote", symbol).await
    }

    /// Get the company profile for a symbol. Finnhub returns `{}` for
    /// unknown symbols; the caller treats an empty object as absent.
    pub async fn get_profile(&self, symbol: &str) -> Result<Value, SnapshotError> {
        self.get_json("/stock/profile2", symbol).await
    }

    async fn get_json(&self, path: &str, symbol: &str) -> Result<Value, SnapshotError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("token", &self.api_key)])
            .send()
            .await
            .map_err(|e| SnapshotError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SnapshotError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SnapshotError::ApiError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn quote_request_carries_symbol_and_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("symbol".into(), "AAPL".into()),
                mockito::Matcher::UrlEncoded("token".into(), "test-key".into()),
            ]))
            .with_body(r#"{"c": 230.45, "pc": 225.6}"#)
            .create_async()
            .await;

        let client = FinnhubClient::new("test-key".to_string(), false)
            .unwrap()
            .with_base_url(server.url());
        let quote = client.get_quote("AAPL").await.unwrap();

        mock.assert_async().await;
        assert_eq!(quote["c"], 230.45);
    }

    #[tokio::test]
    async fn profile_hits_profile2_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stock/profile2")
            .match_query(mockito::Matcher::UrlEncoded("symbol".into(), "MSFT".into()))
            .with_body(r#"{"name": "Microsoft Corporation", "exchange": "NASDAQ"}"#)
            .create_async()
            .await;

        let client = FinnhubClient::new("test-key".to_string(), false)
            .unwrap()
            .with_base_url(server.url());
        let profile = client.get_profile("MSFT").await.unwrap();

        mock.assert_async().await;
        assert_eq!(profile["name"], "Microsoft Corporation");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = FinnhubClient::new("test-key".to_string(), false)
            .unwrap()
            .with_base_url(server.url());
        let err = client.get_quote("AAPL").await.unwrap_err();

        match err {
            SnapshotError::ApiError(msg) => {
                assert!(msg.contains("429"), "unexpected message: {msg}");
            }
            other => panic!("expected ApiError, got: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_maps_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::Any)
            .with_body("not json")
            .create_async()
            .await;

        let client = FinnhubClient::new("test-key".to_string(), false)
            .unwrap()
            .with_base_url(server.url());
        assert!(client.get_quote("AAPL").await.is_err());
    }
}
