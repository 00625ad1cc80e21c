//! API route configuration.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.upload_limit_bytes;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Accounts and sessions
        .route("/api/register", post(handlers::register))
        .route("/api/auth", post(handlers::authenticate))
        .route("/api/auth/:token", delete(handlers::logout))

        // Documents
        .route("/api/docs", get(handlers::list_documents))
        .route(
            "/api/docs",
            post(handlers::upload_document)
                .layer::<_, std::convert::Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(upload_limit)),
        )
        .route(
            "/api/docs/:id",
            get(handlers::get_document).delete(handlers::delete_document),
        )

        .with_state(state)
}
