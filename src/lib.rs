// Sheetscribe - spreadsheet ingestion and guided annotation service

pub mod agents;
pub mod config;
pub mod conversation;
pub mod extractor;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod storage;
pub mod store;
pub mod types;
pub mod utils;
pub mod validator;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
