//! # DocVault API Server
//!
//! REST API over the document store. Authenticated routes expect the session
//! token in the `token` header.
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness and cache sizes
//! - `POST /api/register` - Register a user (admin token required)
//! - `POST /api/auth` - Log in, returning a session token
//! - `DELETE /api/auth/:token` - Log out
//! - `GET /api/docs` - List documents
//! - `POST /api/docs` - Upload a document (multipart)
//! - `GET /api/docs/:id` - Fetch a document
//! - `DELETE /api/docs/:id` - Delete a document
//!
//! ## Example
//!
//! ```rust,ignore
//! use docvault_api::{ApiConfig, ApiServer};
//!
//! let server = ApiServer::new(ApiConfig::from_env()?);
//! server.run(([0, 0, 0, 0], 8080)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod extract;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use extract::Authenticated;
pub use routes::create_router;
pub use state::{ApiConfig, AppState};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server for DocVault.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server backed by in-memory stores.
    pub fn new(config: ApiConfig) -> Self {
        Self::with_state(Arc::new(AppState::new(config)))
    }

    /// Creates a server around an existing state.
    pub fn with_state(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Shared application state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Creates the router with all routes and middleware configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server until ctrl-c, sweeping both caches in the background.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let sweepers = self.state.start_sweepers();

        info!("DocVault API server listening on {}", addr);

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        for sweeper in sweepers {
            sweeper.close().await;
        }
        info!("DocVault API server stopped");
        result
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
