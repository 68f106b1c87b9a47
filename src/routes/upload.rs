use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use tracing::{info, warn};

use crate::extractor;
use crate::models::{AnnotationRecord, AppState, FileCandidate, UploadResponse};
use crate::types::{AppError, AppResult};
use crate::validator::UploadValidator;

pub fn router(state: AppState) -> Router {
    // The validator enforces the per-file ceiling with a structured reason;
    // the transport limit only has to let an over-limit file in so it can
    // be rejected properly.
    let body_limit = (state.config.upload.max_file_size as usize)
        .saturating_mul(state.config.upload.max_files + 1);

    Router::new()
        .route("/api/upload", post(upload_files))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Validate a multipart batch, extract metadata from the accepted files,
/// store their bytes and seed one annotation record per parseable file.
async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let mut candidates = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::InvalidRequest(format!("Malformed multipart body: {err}")))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let content_type = field.content_type().map(|ct| ct.to_string());
        let data = field.bytes().await.map_err(|err| {
            AppError::InvalidRequest(format!("Failed to read upload {filename}: {err}"))
        })?;

        candidates.push(FileCandidate {
            size: data.len() as u64,
            filename,
            content_type,
            data,
        });
    }

    if candidates.is_empty() {
        return Err(AppError::InvalidRequest("No files provided".to_string()));
    }

    info!(count = candidates.len(), "Received upload batch");

    let validator = UploadValidator::new(state.config.upload.clone());
    let outcome = validator.validate(candidates);

    if !outcome.errors.is_empty() {
        let response = UploadResponse {
            message: "Upload batch rejected".to_string(),
            accepted_files: Vec::new(),
            rejected_files: outcome.rejected,
            errors: outcome.errors,
            metadata: Vec::new(),
            record_ids: Vec::new(),
        };
        return Ok((StatusCode::BAD_REQUEST, Json(response)));
    }

    let metadata = extractor::extract_batch(&outcome.accepted);

    let mut record_ids = Vec::new();
    for (candidate, file_metadata) in outcome.accepted.iter().zip(&metadata) {
        // Parse failures are reported in the metadata list; only parseable
        // files get an artifact and a record.
        if file_metadata.error.is_some() {
            continue;
        }

        let uploaded_at = Utc::now();
        let artifact_path = state
            .artifacts
            .save(&candidate.filename, uploaded_at, &candidate.data)
            .await?;

        let record =
            AnnotationRecord::new(candidate, file_metadata, &artifact_path, uploaded_at);
        let record = match state.store.create(record).await {
            Ok(record) => record,
            Err(err) => {
                // No compensating delete: the artifact stays behind.
                warn!(
                    path = %artifact_path.display(),
                    error = %err,
                    "Record write failed after artifact write; artifact is orphaned"
                );
                return Err(err);
            }
        };
        record_ids.push(record.id);
    }

    let accepted_files: Vec<String> = outcome
        .accepted
        .iter()
        .map(|candidate| candidate.filename.clone())
        .collect();

    info!(
        accepted = accepted_files.len(),
        rejected = outcome.rejected.len(),
        records = record_ids.len(),
        "Upload batch processed"
    );

    let response = UploadResponse {
        message: format!("Successfully processed {} files", record_ids.len()),
        accepted_files,
        rejected_files: outcome.rejected,
        errors: Vec::new(),
        metadata,
        record_ids,
    };
    Ok((StatusCode::OK, Json(response)))
}
