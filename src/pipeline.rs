//! Cache-fronted fetch pipeline
//!
//! For each symbol the pipeline checks the cache, calls the matching provider on
//! a miss, and writes the normalized result back with a TTL that depends on the
//! outcome. Empty upstream answers are cached too, briefly, so a bad symbol does
//! not cost one upstream call per request.
//!
//! Cache operations are synchronous and are never held across a provider call,
//! so concurrent misses on one key may each reach upstream; the last write wins.

use std::sync::Arc;

use crate::cache::{Cache, CacheExt, Section};
use crate::data::{
    is_metal, metal_name, EquityProvider, MetalProvider, Overview, Price, ProviderError, Quote,
};

/// TTL for a non-empty overview (24 hours)
pub const OVERVIEW_TTL_MINUTES: u64 = 60 * 24;

/// TTL for an empty overview
pub const OVERVIEW_EMPTY_TTL_MINUTES: u64 = 60;

/// TTL for a non-empty equity or metal price
pub const PRICE_TTL_MINUTES: u64 = 60;

/// TTL for an empty equity or metal price
pub const PRICE_EMPTY_TTL_MINUTES: u64 = 5;

/// Which upstream a symbol is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// One of the recognized precious metal codes
    Metal,
    /// Anything else
    Equity,
}

impl SymbolKind {
    /// Classifies an uppercased symbol
    pub fn classify(symbol: &str) -> Self {
        if is_metal(symbol) {
            SymbolKind::Metal
        } else {
            SymbolKind::Equity
        }
    }
}

/// A provider call that failed, tagged with the operation that made it
#[derive(Debug, thiserror::Error)]
#[error("{operation}: {source}")]
pub struct FetchError {
    /// Name of the failing fetch (e.g. "fetch_overview")
    pub operation: &'static str,
    #[source]
    pub source: ProviderError,
}

impl FetchError {
    fn new(operation: &'static str, source: ProviderError) -> Self {
        Self { operation, source }
    }
}

/// Fetches quotes through the cache
#[derive(Clone)]
pub struct FetchPipeline {
    overview_cache: Arc<dyn Cache>,
    price_cache: Arc<dyn Cache>,
    equities: Arc<dyn EquityProvider>,
    metals: Arc<dyn MetalProvider>,
}

impl FetchPipeline {
    /// Creates a pipeline
    ///
    /// # Arguments
    /// * `overview_cache` - Cache for company overviews (long-lived, usually durable)
    /// * `price_cache` - Cache for equity and metal prices (short-lived, usually in memory)
    /// * `equities` - Equity data provider
    /// * `metals` - Metal spot price provider
    pub fn new(
        overview_cache: Arc<dyn Cache>,
        price_cache: Arc<dyn Cache>,
        equities: Arc<dyn EquityProvider>,
        metals: Arc<dyn MetalProvider>,
    ) -> Self {
        Self {
            overview_cache,
            price_cache,
            equities,
            metals,
        }
    }

    /// Fetches the quote for an uppercased symbol
    ///
    /// # Returns
    /// * `Ok(Quote)` - The combined quote; check [`Quote::is_valid`] before showing it
    /// * `Err(FetchError)` - If a provider call failed
    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        match SymbolKind::classify(symbol) {
            SymbolKind::Metal => {
                let price = self.fetch_metal_price(symbol).await?;
                let name = metal_name(symbol).unwrap_or_default();
                Ok(Quote::from_price(name, price))
            }
            SymbolKind::Equity => {
                let (overview, price) = futures::try_join!(
                    self.fetch_overview(symbol),
                    self.fetch_stock_price(symbol)
                )?;
                Ok(Quote::from_price(overview.name, price))
            }
        }
    }

    /// Fetches an equity overview, caching it for a day (an hour if empty)
    pub async fn fetch_overview(&self, symbol: &str) -> Result<Overview, FetchError> {
        if let Some(overview) = self.overview_cache.lookup::<Overview>(Section::Overview, symbol) {
            tracing::debug!("Returning cached overview for {}", symbol);
            return Ok(overview);
        }

        tracing::info!("Fetching overview for {}", symbol);
        let overview = self
            .equities
            .overview(symbol)
            .await
            .map_err(|e| FetchError::new("fetch_overview", e))?;

        let ttl = if overview.is_empty() {
            OVERVIEW_EMPTY_TTL_MINUTES
        } else {
            OVERVIEW_TTL_MINUTES
        };
        self.overview_cache.set(Section::Overview, symbol, &overview, ttl);

        Ok(overview)
    }

    /// Fetches an equity price, caching it for an hour (five minutes if empty)
    pub async fn fetch_stock_price(&self, symbol: &str) -> Result<Price, FetchError> {
        if let Some(price) = self.cached_price(symbol) {
            return Ok(price);
        }

        tracing::info!("Fetching price for {}", symbol);
        let price = self
            .equities
            .price(symbol)
            .await
            .map_err(|e| FetchError::new("fetch_stock_price", e))?;

        self.store_price(symbol, &price);
        Ok(price)
    }

    /// Fetches a metal spot price, caching it for an hour (five minutes if empty)
    pub async fn fetch_metal_price(&self, symbol: &str) -> Result<Price, FetchError> {
        if let Some(price) = self.cached_price(symbol) {
            return Ok(price);
        }

        tracing::info!("Fetching metal price for {}", symbol);
        let price = self
            .metals
            .spot_price(symbol)
            .await
            .map_err(|e| FetchError::new("fetch_metal_price", e))?;

        self.store_price(symbol, &price);
        Ok(price)
    }

    fn cached_price(&self, symbol: &str) -> Option<Price> {
        let price = self.price_cache.lookup::<Price>(Section::Price, symbol)?;
        tracing::debug!("Returning cached price for {}", symbol);
        Some(price)
    }

    fn store_price(&self, symbol: &str, price: &Price) {
        let ttl = if price.is_empty() {
            PRICE_EMPTY_TTL_MINUTES
        } else {
            PRICE_TTL_MINUTES
        };
        self.price_cache.set(Section::Price, symbol, price, ttl);
    }
}
