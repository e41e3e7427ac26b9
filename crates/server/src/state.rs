use qamatch_core::ServerSettings;
use qamatch_knowledge::MatcherContext;
use std::sync::Arc;

/// Shared application state
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server settings
    pub settings: Arc<ServerSettings>,

    /// Name of the served catalog
    pub catalog_name: String,

    /// Loaded matcher (shared across requests, never mutated)
    pub matcher: Arc<MatcherContext>,
}

impl ServerState {
    pub fn new(settings: ServerSettings, catalog_name: &str, matcher: MatcherContext) -> Self {
        Self {
            settings: Arc::new(settings),
            catalog_name: catalog_name.to_string(),
            matcher: Arc::new(matcher),
        }
    }
}
