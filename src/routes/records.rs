use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::agents::{AnalysisOutcome, FileAnalyzer};
use crate::models::{
    AnalyzeRequest, AnnotationRecord, AppState, RecordListResponse, RecordSummary,
};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/records", get(list_records))
        .route("/api/records/{id}", get(get_record))
        .route("/api/records/{id}/analyze", post(analyze_record))
        .with_state(state)
}

async fn list_records(State(state): State<AppState>) -> AppResult<Json<RecordListResponse>> {
    let records = state.store.list().await?;
    let summaries = records.iter().map(RecordSummary::from).collect();
    Ok(Json(RecordListResponse { records: summaries }))
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AnnotationRecord>> {
    let record = state.store.read(&id).await?;
    Ok(Json(record))
}

/// Run the external field-role analysis for one record. The outcome is
/// tagged so the caller can tell a structured result from a raw-text
/// fallback.
async fn analyze_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AnalyzeRequest>,
) -> AppResult<Json<AnalysisOutcome>> {
    let record = state.store.read(&id).await?;
    let analyzer = FileAnalyzer::new(&state.config.llm);
    let outcome = analyzer.analyze(&record, &request.message).await?;
    Ok(Json(outcome))
}
