//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/upload` - Spreadsheet batch upload, validation and extraction
//! - `/api/conversation` - Advance a record's annotation conversation
//! - `/api/records` - Enumerate and fetch annotation records
//! - `/api/records/{id}/analyze` - Field-role analysis via the LLM agent
//! - `/api/health` - Health checks

pub mod conversation;
pub mod health;
pub mod records;
pub mod upload;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::AppState;

/// Create the main application router. API routes are prefixed with `/api/`.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    Router::new()
        .merge(upload::router(state.clone()))
        .merge(conversation::router(state.clone()))
        .merge(records::router(state))
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
}
