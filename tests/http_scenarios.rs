//! End-to-end request scenarios through the full router
//!
//! Overviews go through a SQLite file and prices through memory, as in the
//! binary. Providers are counting fakes so upstream traffic can be asserted.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use quotecache::cache::{DbCache, MemoryCache};
use quotecache::data::{EquityProvider, MetalProvider, Overview, Price, ProviderError};
use quotecache::db;
use quotecache::lookup::LookupService;
use quotecache::pipeline::FetchPipeline;
use quotecache::server::{self, AppState, StaticFiles};

#[derive(Default)]
struct CountingEquities {
    overview_calls: AtomicUsize,
    price_calls: AtomicUsize,
}

impl CountingEquities {
    fn calls(&self) -> (usize, usize) {
        (
            self.overview_calls.load(Ordering::SeqCst),
            self.price_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl EquityProvider for CountingEquities {
    async fn overview(&self, symbol: &str) -> Result<Overview, ProviderError> {
        self.overview_calls.fetch_add(1, Ordering::SeqCst);
        if symbol != "AAPL" {
            return Ok(Overview::default());
        }
        Ok(Overview {
            symbol: "AAPL".to_string(),
            asset_type: "Common Stock".to_string(),
            name: "Apple Inc".to_string(),
            description: "Consumer electronics".to_string(),
            exchange: "NASDAQ".to_string(),
        })
    }

    async fn price(&self, symbol: &str) -> Result<Price, ProviderError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        if symbol != "AAPL" {
            return Ok(Price::default());
        }
        Ok(Price {
            symbol: "AAPL".to_string(),
            date: "2024-07-15".to_string(),
            open: 230.0,
            high: 236.0,
            low: 229.5,
            price: 234.4,
            volume: 62_631_252.0,
        })
    }
}

#[derive(Default)]
struct CountingMetals {
    calls: AtomicUsize,
}

#[async_trait]
impl MetalProvider for CountingMetals {
    async fn spot_price(&self, symbol: &str) -> Result<Price, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Price {
            symbol: symbol.to_string(),
            date: "2024-07-15T10:00:00Z".to_string(),
            price: 1900.5,
            ..Price::default()
        })
    }
}

struct Fixture {
    dir: TempDir,
    equities: Arc<CountingEquities>,
    metals: Arc<CountingMetals>,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        db::create_database(&dir.path().join("quotes.db")).unwrap();
        std::fs::create_dir(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join("public").join("index.html"), "<h1>quotes</h1>").unwrap();
        Self {
            dir,
            equities: Arc::new(CountingEquities::default()),
            metals: Arc::new(CountingMetals::default()),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Builds a router as the binary would at startup
    fn app(&self) -> Router {
        let store = db::open_database(&self.path().join("quotes.db")).unwrap();
        let pipeline = FetchPipeline::new(
            Arc::new(DbCache::new(store)),
            Arc::new(MemoryCache::new()),
            self.equities.clone(),
            self.metals.clone(),
        );
        let state = AppState {
            lookup: LookupService::new(pipeline),
        };
        let files = StaticFiles::new(self.path().join("static"), self.path().join("public"));
        server::router(state, &files)
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}

async fn get_quotes(app: &Router, uri: &str) -> Vec<Value> {
    let (status, body) = get(app, uri).await;
    assert_eq!(status, StatusCode::OK, "Unexpected body: {}", body);
    serde_json::from_str(&body).expect("Response should be a JSON array")
}

#[tokio::test]
async fn test_repeat_request_is_served_from_cache() {
    let fixture = Fixture::new();
    let app = fixture.app();

    let first = get_quotes(&app, "/api/lookup/?sym=AAPL").await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0]["symbol"], "AAPL");
    assert_eq!(first[0]["name"], "Apple Inc");
    assert_eq!(first[0]["price"], 234.4);
    assert_eq!(fixture.equities.calls(), (1, 1));

    let second = get_quotes(&app, "/api/lookup/?sym=aapl").await;
    assert_eq!(second, first);
    assert_eq!(fixture.equities.calls(), (1, 1));
}

#[tokio::test]
async fn test_overviews_survive_restart_but_prices_do_not() {
    let fixture = Fixture::new();

    get_quotes(&fixture.app(), "/api/lookup/?sym=AAPL").await;
    let restarted = fixture.app();
    let quotes = get_quotes(&restarted, "/api/lookup/?sym=AAPL").await;

    assert_eq!(quotes[0]["name"], "Apple Inc");
    assert_eq!(fixture.equities.calls(), (1, 2));
}

#[tokio::test]
async fn test_mixed_request_keeps_order_and_drops_unknown_symbols() {
    let fixture = Fixture::new();
    let app = fixture.app();

    let quotes = get_quotes(&app, "/api/lookup?sym=xau,%20ZZZZ%20,AAPL,").await;

    let symbols: Vec<&str> = quotes
        .iter()
        .map(|q| q["symbol"].as_str().unwrap())
        .collect();
    assert_eq!(symbols, vec!["XAU", "AAPL"]);
    assert_eq!(quotes[0]["name"], "Spot Gold");
    assert_eq!(quotes[0]["price"], 1900.5);
    assert_eq!(fixture.metals.calls.load(Ordering::SeqCst), 1);

    get_quotes(&app, "/api/lookup?sym=ZZZZ").await;
    assert_eq!(fixture.equities.calls(), (2, 2));
}

#[tokio::test]
async fn test_missing_sym_is_rejected() {
    let fixture = Fixture::new();
    let app = fixture.app();

    let (status, body) = get(&app, "/api/lookup/").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "sym required");

    let (status, _) = get(&app, "/api/lookup/?sym=%20,%20").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(fixture.equities.calls(), (0, 0));
}

#[tokio::test]
async fn test_web_root_is_served_outside_api() {
    let fixture = Fixture::new();
    let app = fixture.app();

    let (status, body) = get(&app, "/index.html").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>quotes</h1>");
}
