use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Chat request
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// User utterance; a missing or null field is treated as empty input
    #[serde(default)]
    pub question: Option<String>,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Answer one question against the loaded catalog.
///
/// Always returns an `answer`: either a catalog answer or one of the
/// configured sentinel replies. Fails only when the embedding provider is
/// unreachable or the body is not a JSON object.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ServerResult<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let question = request.question.as_deref().unwrap_or_default();
    let answer = state.matcher.answer_question(question).await?;
    Ok(Json(ChatResponse { answer }))
}
