use crate::cache::ResponseCache;
use crate::config::Config;
use crate::llm_client::ProviderRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Process-wide response cache; the only state shared across requests.
    pub cache: ResponseCache,
    pub providers: ProviderRegistry,
}
