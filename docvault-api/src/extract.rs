//! Session token extraction.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use docvault_core::constants::TOKEN_HEADER;
use docvault_core::types::Caller;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller behind the request's `token` header.
///
/// Rejects with 401 when the header is missing, not valid UTF-8, or names
/// no live session.
#[derive(Clone, Debug)]
pub struct Authenticated(pub Caller);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        state
            .auth
            .authorize(token)
            .map(Authenticated)
            .map_err(|_| ApiError::unauthorized())
    }
}
