use std::sync::Arc;

use crate::config::Config;
use crate::highlight::cache::HighlightCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Memoization boundary shared by every highlight request.
    pub highlight_cache: Arc<HighlightCache>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let highlight_cache = Arc::new(HighlightCache::new(config.highlight_cache_slots));
        Self {
            config,
            highlight_cache,
        }
    }
}
