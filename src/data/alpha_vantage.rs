//! Alpha Vantage equity data client
//!
//! Fetches company overviews (`function=OVERVIEW`) and latest quotes
//! (`function=GLOBAL_QUOTE`) and normalizes them into [`Overview`] and [`Price`].
//! Alpha Vantage answers rate-limited requests and unknown tickers with HTTP 200
//! and a body lacking the expected fields; those normalize to empty payloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{read_body, EquityProvider, Overview, Price, ProviderError};

/// Base URL for the Alpha Vantage API
const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response from the OVERVIEW function
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OverviewResponse {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "AssetType")]
    asset_type: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Exchange")]
    exchange: String,
}

/// Response from the GLOBAL_QUOTE function
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: GlobalQuote,
}

/// Quote fields, all delivered as strings
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: String,
    #[serde(rename = "02. open")]
    open: String,
    #[serde(rename = "03. high")]
    high: String,
    #[serde(rename = "04. low")]
    low: String,
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume")]
    volume: String,
    #[serde(rename = "07. latest trading day")]
    date: String,
}

/// Client for the Alpha Vantage API
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Creates a client for the public API using `api_key`
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
            base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Calls `function` for `symbol` and returns the raw body
    async fn query(&self, function: &str, symbol: &str) -> Result<String, ProviderError> {
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;
        read_body(response).await
    }
}

#[async_trait]
impl EquityProvider for AlphaVantageClient {
    async fn overview(&self, symbol: &str) -> Result<Overview, ProviderError> {
        let body = self.query("OVERVIEW", symbol).await?;
        parse_overview(&body)
    }

    async fn price(&self, symbol: &str) -> Result<Price, ProviderError> {
        let body = self.query("GLOBAL_QUOTE", symbol).await?;
        parse_price(&body)
    }
}

/// Parses an OVERVIEW body into an [`Overview`]
fn parse_overview(body: &str) -> Result<Overview, ProviderError> {
    let response: OverviewResponse = serde_json::from_str(body)?;
    Ok(Overview {
        symbol: response.symbol,
        asset_type: response.asset_type,
        name: response.name,
        description: response.description,
        exchange: response.exchange,
    })
}

/// Parses a GLOBAL_QUOTE body into a [`Price`]
fn parse_price(body: &str) -> Result<Price, ProviderError> {
    let response: GlobalQuoteResponse = serde_json::from_str(body)?;
    let quote = response.global_quote;
    Ok(Price {
        symbol: quote.symbol,
        date: quote.date,
        open: parse_number(&quote.open),
        high: parse_number(&quote.high),
        low: parse_number(&quote.low),
        price: parse_number(&quote.price),
        volume: parse_number(&quote.volume),
    })
}

/// Parses a numeric string, falling back to 0.0 for blank or malformed input
fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}
