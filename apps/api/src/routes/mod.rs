pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(handlers::handle_api_health))
        // Profile bank
        .route("/api/cvs", get(handlers::handle_list_cvs))
        .route("/api/cvs/:id", delete(handlers::handle_remove_cv))
        .route("/api/index-bank", post(handlers::handle_index_bank))
        // Matching
        .route("/api/match", post(handlers::handle_match))
        .route("/api/runs/:id", get(handlers::handle_get_run))
        // Admin
        .route("/api/admin/summary", get(handlers::handle_admin_summary))
        .route("/api/admin/reconcile", post(handlers::handle_reconcile))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
