mod browse;
mod cache;
mod config;
mod dashboard;
mod debounce;
mod error;
mod models;
mod pagination;
mod query;
mod routes;
mod source;
mod store;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::browse::render_frame;
use crate::cache::{QueryCache, QueryStatus};
use crate::config::{Command, Config};
use crate::dashboard::{Dashboard, DashboardView};
use crate::models::filter::FilterState;
use crate::query::QueryKey;
use crate::routes::AppState;
use crate::source::HttpJobSource;
use crate::store::{FileUrl, MemoryUrl, SearchStateStore, UrlState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobfinder=info,tower_http=info"));
    let logs = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_json {
        logs.json().init();
    } else {
        logs.init();
    }

    let source = HttpJobSource::new(&config.api_url, config.request_timeout())?;
    tracing::info!("Using job API at {}", source.endpoint());
    let cache = QueryCache::new(Arc::new(source), config.cache_settings());

    match config.resolved_command() {
        Command::Serve { listen_addr } => serve(cache, &listen_addr).await,
        Command::Search { filters, json } => search(cache, &filters, json).await,
        Command::Browse {
            filters,
            state_file,
            debounce_ms,
        } => {
            let debounce = Duration::from_millis(debounce_ms);
            match state_file {
                Some(path) => {
                    let mut url = FileUrl::new(path);
                    if !filters.is_empty() {
                        url.replace(&filters)?;
                    }
                    tracing::info!("Persisting filters to {}", url.path().display());
                    run_browse(Dashboard::new(SearchStateStore::new(url), cache, debounce)).await
                }
                None => {
                    let url = MemoryUrl::new(filters);
                    run_browse(Dashboard::new(SearchStateStore::new(url), cache, debounce)).await
                }
            }
        }
    }
}

async fn serve(cache: QueryCache, listen_addr: &str) -> anyhow::Result<()> {
    let app = routes::router(AppState { cache })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("Listening on {listen_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn search(cache: QueryCache, filters: &str, json: bool) -> anyhow::Result<()> {
    let filters = FilterState::from_query(filters);
    let key = QueryKey::from_state(&filters);
    let page = cache.load(&key).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(page.as_ref())?);
        return Ok(());
    }

    let page_size = cache.settings().page_size;
    let status = QueryStatus::Success {
        page,
        is_fetching: false,
    };
    let view = DashboardView::from_status(filters, key, &status, page_size);
    print!("{}", render_frame(&view));
    Ok(())
}

async fn run_browse<L: UrlState>(dashboard: Dashboard<L>) -> anyhow::Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    tokio::select! {
        result = browse::run(dashboard, input, &mut out) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            Ok(())
        }
    }
}
