use crate::state::ServerState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub catalog: String,
    pub entries: usize,
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

/// Health check endpoint (liveness)
///
/// The server only starts once the catalog is loaded, so reaching this
/// handler means it is ready to answer.
pub async fn health_check(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let provider = state.matcher.engine().provider();

    Json(HealthResponse {
        status: "ok",
        catalog: state.catalog_name.clone(),
        entries: state.matcher.catalog().len(),
        provider: provider.provider_name().to_string(),
        model: provider.model_name().to_string(),
        dimensions: provider.dimensions(),
    })
}
