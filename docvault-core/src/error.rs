//! Error types for DocVault.
//!
//! Every failure a request can hit maps to one of six [`ErrorKind`]s, each
//! with a stable machine-readable code and HTTP status. Cache and session
//! lookups never produce errors: absence is reported as `None`.

use thiserror::Error;

/// Result type alias using `VaultError`.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Main error type for all DocVault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CALLER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Missing, invalid, expired or revoked credentials.
    ///
    /// Carries no detail so the reasons stay indistinguishable.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but the caller may not access the resource.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// No such document or user.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource already exists (e.g. a duplicate login).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed request body, metadata or query parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed JSON supplied by the caller.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The secure random source was unavailable.
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    /// Password hashing or hash parsing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Store or runtime failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable classification of a [`VaultError`] at the service boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid credentials.
    Unauthorized,
    /// Visibility or ownership check failed.
    Forbidden,
    /// No such document or user.
    NotFound,
    /// Duplicate resource.
    Conflict,
    /// Malformed input.
    InvalidInput,
    /// Store, crypto or runtime failure.
    Internal,
}

impl ErrorKind {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for this kind.
    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidInput => 400,
            ErrorKind::Internal => 500,
        }
    }
}

impl VaultError {
    /// Shorthand for [`VaultError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        VaultError::NotFound(what.into())
    }

    /// Shorthand for [`VaultError::Forbidden`].
    pub fn forbidden(reason: impl Into<String>) -> Self {
        VaultError::Forbidden(reason.into())
    }

    /// Shorthand for [`VaultError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        VaultError::InvalidInput(reason.into())
    }

    /// Shorthand for [`VaultError::Internal`].
    pub fn internal(reason: impl Into<String>) -> Self {
        VaultError::Internal(reason.into())
    }

    /// Returns the boundary classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Unauthorized => ErrorKind::Unauthorized,
            VaultError::Forbidden(_) => ErrorKind::Forbidden,
            VaultError::NotFound(_) => ErrorKind::NotFound,
            VaultError::Conflict(_) => ErrorKind::Conflict,
            VaultError::InvalidInput(_) | VaultError::JsonError(_) => ErrorKind::InvalidInput,
            VaultError::TokenGeneration(_)
            | VaultError::PasswordHash(_)
            | VaultError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}
