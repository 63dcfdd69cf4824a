//! Multi-symbol quote lookup
//!
//! Parses the comma-separated `sym` parameter and runs the fetch pipeline for
//! each symbol in order. A provider failure on any symbol fails the whole lookup:
//! clients get either every requested quote that exists or an error, never a
//! silently partial list.

use thiserror::Error;

use crate::data::Quote;
use crate::pipeline::{FetchError, FetchPipeline};

/// Errors returned by [`LookupService`]
#[derive(Debug, Error)]
pub enum LookupError {
    /// No symbols were given
    #[error("sym required")]
    MissingSymbols,

    /// A provider call failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Splits a `sym` query value into uppercased symbols
///
/// Whitespace around each symbol is trimmed and empty segments are dropped.
///
/// # Returns
/// * `Ok(Vec<String>)` - Symbols in the order given
/// * `Err(LookupError::MissingSymbols)` - If nothing usable remains
pub fn parse_symbols(query: &str) -> Result<Vec<String>, LookupError> {
    let symbols: Vec<String> = query
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect();

    if symbols.is_empty() {
        return Err(LookupError::MissingSymbols);
    }
    Ok(symbols)
}

/// Resolves symbol lists into quotes
#[derive(Clone)]
pub struct LookupService {
    pipeline: FetchPipeline,
}

impl LookupService {
    pub fn new(pipeline: FetchPipeline) -> Self {
        Self { pipeline }
    }

    /// Looks up every symbol in a raw `sym` query value
    pub async fn lookup_query(&self, query: &str) -> Result<Vec<Quote>, LookupError> {
        let symbols = parse_symbols(query)?;
        self.lookup(&symbols).await
    }

    /// Looks up `symbols` in order, keeping only valid quotes
    pub async fn lookup(&self, symbols: &[String]) -> Result<Vec<Quote>, LookupError> {
        let mut quotes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let quote = self.pipeline.fetch_quote(symbol).await?;
            if quote.is_valid() {
                quotes.push(quote);
            }
        }
        Ok(quotes)
    }
}
