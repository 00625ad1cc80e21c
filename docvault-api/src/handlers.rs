//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, rejection::JsonRejection, rejection::QueryRejection},
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::{debug, info};

use docvault_core::error::VaultError;
use docvault_core::types::{DocumentId, DocumentPayload, NewDocument};
use docvault_documents::{ListingRequest, ServedDocument};

use crate::dto::*;
use crate::error::ApiError;
use crate::extract::Authenticated;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

// ═══════════════════════════════════════════════════════════════════════════
// Auth Handlers
// ═══════════════════════════════════════════════════════════════════════════

/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<ResponseEnvelope<RegisterResponse>>> {
    let Json(req) = payload?;

    state.auth.register(&req.token, &req.login, &req.pswd).await?;

    Ok(Json(ResponseEnvelope {
        response: RegisterResponse { login: req.login },
    }))
}

/// POST /api/auth
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<ResponseEnvelope<AuthResponse>>> {
    let Json(req) = payload?;

    let token = state.auth.authenticate(&req.login, &req.pswd).await?;

    Ok(Json(ResponseEnvelope {
        response: AuthResponse {
            token: token.into_inner(),
        },
    }))
}

/// DELETE /api/auth/:token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(token): Path<String>,
) -> impl IntoResponse {
    state.auth.logout(&token);
    debug!(user_id = %caller.id, "Logout requested");
    Json(acknowledge(token))
}

// ═══════════════════════════════════════════════════════════════════════════
// Document Handlers
// ═══════════════════════════════════════════════════════════════════════════

/// GET /api/docs
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    query: std::result::Result<Query<ListDocumentsQuery>, QueryRejection>,
) -> Result<Json<DataEnvelope<ListDocumentsResponse>>> {
    let Query(query) = query?;
    let request = ListingRequest::from_params(
        query.login,
        query.key.as_deref(),
        query.value.as_deref(),
        query.limit,
    )?;

    let docs = state.documents.list(&caller, request).await?;

    Ok(Json(DataEnvelope {
        data: ListDocumentsResponse {
            docs: docs.into_iter().map(DocumentDto::from).collect(),
        },
    }))
}

/// POST /api/docs
///
/// Multipart body: a `meta` part with the document metadata, and either a
/// `file` part (when `meta.file` is true) or a `json` part.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    mut multipart: Multipart,
) -> Result<Json<DataEnvelope<UploadResponse>>> {
    let mut meta: Option<UploadMeta> = None;
    let mut json: Option<String> = None;
    let mut file: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("meta") => {
                let text = field.text().await?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| ApiError::bad_request(format!("Invalid metadata: {e}")))?;
                meta = Some(parsed);
            }
            Some("json") => json = Some(field.text().await?),
            Some("file") => file = Some(read_file(field).await?),
            other => debug!(field = ?other, "Ignoring unknown upload field"),
        }
    }

    let meta = meta.ok_or_else(|| ApiError::bad_request("Missing metadata"))?;

    let (payload, mime) = if meta.file {
        let (part_mime, bytes) = file.ok_or_else(|| ApiError::bad_request("File not found"))?;
        (DocumentPayload::File(bytes), meta.mime.or(part_mime))
    } else {
        let raw = json.ok_or_else(|| ApiError::bad_request("Missing JSON data"))?;
        let value = serde_json::from_str(&raw).map_err(VaultError::from)?;
        (DocumentPayload::Json(value), meta.mime)
    };

    let document = state
        .documents
        .create(
            &caller,
            NewDocument {
                name: meta.name,
                mime: mime.unwrap_or_default(),
                public: meta.public,
                grant: meta.grant,
                payload,
            },
        )
        .await?;

    let json = match document.payload {
        DocumentPayload::Json(value) => Some(value),
        DocumentPayload::File(_) => None,
    };
    info!(id = %document.id, "Upload stored");

    Ok(Json(DataEnvelope {
        data: UploadResponse {
            json,
            file: document.name,
        },
    }))
}

async fn read_file(field: Field<'_>) -> Result<(Option<String>, Bytes)> {
    let mime = field.content_type().map(str::to_owned);
    let bytes = field.bytes().await?;
    Ok((mime, bytes))
}

/// GET /api/docs/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Response> {
    let served = state.documents.get(&caller, &DocumentId::from(id)).await?;

    Ok(match served {
        ServedDocument::Json(value) => Json(DataEnvelope { data: value }).into_response(),
        ServedDocument::File { mime, bytes } => {
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
    })
}

/// DELETE /api/docs/:id
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state
        .documents
        .delete(&caller, &DocumentId::from(id.as_str()))
        .await?;
    Ok(Json(acknowledge(id)))
}

// ═══════════════════════════════════════════════════════════════════════════
// Health
// ═══════════════════════════════════════════════════════════════════════════

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.session_stats();
    let cache = state.document_cache_stats();

    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.uptime().as_secs(),
        sessions: sessions.total_entries,
        cached_entries: cache.total_entries,
        cache_hit_rate: cache.hit_rate(),
    })
}
