//! GoldAPI precious metal spot price client
//!
//! Fetches the USD spot price for a metal code and normalizes it into a [`Price`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use reqwest::Client;
use serde::Deserialize;

use super::{read_body, MetalProvider, Price, ProviderError};

/// Base URL for the GoldAPI service
const GOLD_API_BASE_URL: &str = "https://www.goldapi.io";

/// Header carrying the API token
const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Quote currency for all spot prices
const QUOTE_CURRENCY: &str = "USD";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Spot price response from GoldAPI
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpotPriceResponse {
    /// Unix timestamp of the quote
    timestamp: i64,
    /// Metal code (e.g. "XAU")
    metal: String,
    open_price: f64,
    low_price: f64,
    high_price: f64,
    price: f64,
}

/// Client for the GoldAPI service
#[derive(Debug, Clone)]
pub struct GoldApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoldApiClient {
    /// Creates a client for the public API using `api_key`
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
            base_url: GOLD_API_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl MetalProvider for GoldApiClient {
    async fn spot_price(&self, symbol: &str) -> Result<Price, ProviderError> {
        let url = format!(
            "{}/api/{}/{}",
            self.base_url.trim_end_matches('/'),
            symbol,
            QUOTE_CURRENCY
        );
        let response = self
            .client
            .get(&url)
            .header(ACCESS_TOKEN_HEADER, &self.api_key)
            .send()
            .await?;
        let body = read_body(response).await?;
        parse_spot_price(&body)
    }
}

/// Parses a spot price body into a [`Price`]
fn parse_spot_price(body: &str) -> Result<Price, ProviderError> {
    let response: SpotPriceResponse = serde_json::from_str(body)?;
    Ok(Price {
        symbol: response.metal,
        date: format_timestamp(response.timestamp),
        open: response.open_price,
        high: response.high_price,
        low: response.low_price,
        price: response.price,
        volume: 0.0,
    })
}

/// Renders a unix timestamp as RFC 3339, or an empty string when absent
fn format_timestamp(timestamp: i64) -> String {
    if timestamp == 0 {
        return String::new();
    }
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}
