//! quotecache - equity and precious metal quotes over HTTP
//!
//! Serves `/api/lookup/` backed by Alpha Vantage and GoldAPI, with company
//! overviews cached in the database file and prices cached in memory.

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use quotecache::cache::{Cache, DbCache, MemoryCache};
use quotecache::cli::{Cli, ServeConfig, StartupConfig, USAGE};
use quotecache::data::{AlphaVantageClient, GoldApiClient};
use quotecache::lookup::LookupService;
use quotecache::pipeline::FetchPipeline;
use quotecache::server::{self, AppState};
use quotecache::{db, logging};

/// Builds the cache, pipeline and router, then serves until shutdown
async fn run_server(config: ServeConfig) -> Result<(), Box<dyn Error>> {
    logging::init_logging(&config.log_level)?;

    let store = db::open_database(&config.database)?;
    let overview_cache: Arc<dyn Cache> = Arc::new(DbCache::new(store));
    let price_cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

    let pipeline = FetchPipeline::new(
        overview_cache,
        price_cache,
        Arc::new(AlphaVantageClient::new(config.alphavantage_key)),
        Arc::new(GoldApiClient::new(config.goldapi_key)),
    );
    let state = AppState {
        lookup: LookupService::new(pipeline),
    };
    let app = server::router(state, &config.static_files);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("Listening on {}...", config.port);
    server::serve(listener, app).await?;

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match StartupConfig::from_cli(&cli)? {
        StartupConfig::Usage => print!("{}", USAGE),
        StartupConfig::Init(path) => {
            db::create_database(&path)?;
            println!("Initialized '{}'", path.display());
        }
        StartupConfig::Serve(config) => run_server(config).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
