use std::sync::Arc;

use crate::access::rate_limit::RateLimiter;
use crate::config::Config;
use crate::llm_client::Completer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Pluggable completion backend. `None` when the provider client could not
    /// be built at startup; summarization then answers 500.
    pub completer: Option<Arc<dyn Completer>>,
    /// The only mutable shared state: per-address request counters.
    pub limiter: RateLimiter,
}
