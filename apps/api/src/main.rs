mod cache;
mod config;
mod document;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod optimize;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::llm_client::ProviderRegistry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparsable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM providers (one per configured API key)
    let providers = ProviderRegistry::from_config(&config)?;
    info!(
        "LLM providers ready (default: {}, timeout: {}s)",
        providers.default_kind(),
        config.llm_timeout_secs
    );

    // Initialize response cache (directory is created lazily on first write)
    let cache = ResponseCache::on_disk(&config.cache_dir, config.cache_ttl_hours);
    info!(
        "Response cache at {} (TTL {}h)",
        config.cache_dir.display(),
        config.cache_ttl_hours
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        cache,
        providers,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
