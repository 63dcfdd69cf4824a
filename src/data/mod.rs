//! Core data models and upstream provider adapters
//!
//! This module contains the normalized quote types stored in the cache and
//! returned to clients, plus the clients that translate each upstream API's
//! response into those types.

pub mod alpha_vantage;
pub mod gold_api;
pub mod metals;

pub use alpha_vantage::AlphaVantageClient;
pub use gold_api::GoldApiClient;
pub use metals::{is_metal, metal_name, Metal, METALS};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Company identity data for an equity symbol
///
/// An overview with an empty `symbol` is a confirmed-empty upstream answer
/// (unknown ticker or rate-limited request), not a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub symbol: String,
    #[serde(rename = "assettype")]
    pub asset_type: String,
    pub name: String,
    pub description: String,
    pub exchange: String,
}

impl Overview {
    /// Whether the upstream returned nothing for this symbol
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }
}

/// Latest trading data for an equity or metal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub symbol: String,
    /// Trading day for equities, RFC 3339 timestamp for metals
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume: f64,
}

impl Price {
    /// Whether the upstream returned nothing for this symbol
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }
}

/// A quote as returned to HTTP clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume: f64,
}

impl Quote {
    /// Combines a display name with price fields
    pub fn from_price(name: impl Into<String>, price: Price) -> Self {
        Self {
            symbol: price.symbol,
            name: name.into(),
            date: price.date,
            open: price.open,
            high: price.high,
            low: price.low,
            price: price.price,
            volume: price.volume,
        }
    }

    /// Whether the quote may be included in a response
    pub fn is_valid(&self) -> bool {
        !self.symbol.is_empty()
    }
}

/// Errors that can occur when calling an upstream provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Source of equity overviews and prices
#[async_trait]
pub trait EquityProvider: Send + Sync {
    /// Fetches company identity data for `symbol`
    async fn overview(&self, symbol: &str) -> Result<Overview, ProviderError>;

    /// Fetches the latest price for `symbol`
    async fn price(&self, symbol: &str) -> Result<Price, ProviderError>;
}

/// Source of precious metal spot prices
#[async_trait]
pub trait MetalProvider: Send + Sync {
    /// Fetches the spot price for the metal code `symbol`
    async fn spot_price(&self, symbol: &str) -> Result<Price, ProviderError>;
}

/// Reads a response body, turning non-2xx statuses into errors
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(text)
}
