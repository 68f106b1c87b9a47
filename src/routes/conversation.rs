use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::conversation::ConversationEngine;
use crate::models::{AdvanceRequest, AdvanceResponse, AppState};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/conversation", post(advance_conversation))
        .with_state(state)
}

/// Advance one record's annotation conversation by one step. Each call is
/// independent: the step index comes from the caller, not server memory.
async fn advance_conversation(
    State(state): State<AppState>,
    Json(request): Json<AdvanceRequest>,
) -> AppResult<Json<AdvanceResponse>> {
    let engine = ConversationEngine::new(state.config.conversation.affirmative_tokens.clone());
    let transition = engine
        .advance(&state.store, &request.record_id, request.step, &request.reply)
        .await?;

    Ok(Json(AdvanceResponse {
        record_id: request.record_id,
        status: transition.status,
        prompt: transition.prompt,
        record: transition.record,
    }))
}
