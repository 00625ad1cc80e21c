//! Service-wide constants for DocVault.
//!
//! Cache timings follow one rule: the sweep interval is longer than the
//! default TTL, so the sweeper never races entries that are still young.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE TIMINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default lifetime of sessions, cached documents and cached listings.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default interval between background sweeps of expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Number of expired keys removed per write-lock acquisition during a sweep.
pub const DEFAULT_SWEEP_BATCH_SIZE: usize = 256;

/// Upper bound applied to any requested TTL.
///
/// Keeps `Instant + ttl` from overflowing on pathological inputs.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

// ═══════════════════════════════════════════════════════════════════════════════
// SESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Random bytes per session token (hex encoded to twice this length).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Request header carrying the session token.
pub const TOKEN_HEADER: &str = "token";

// ═══════════════════════════════════════════════════════════════════════════════
// LISTINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Listing size used when the caller omits a limit or passes zero.
pub const DEFAULT_LISTING_LIMIT: usize = 10;

/// Largest listing a single request may ask for.
pub const MAX_LISTING_LIMIT: usize = 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENTS & CREDENTIALS
// ═══════════════════════════════════════════════════════════════════════════════

/// MIME type reported for structured (JSON) documents without an explicit one.
pub const JSON_MIME: &str = "application/json";

/// Default maximum size of an upload request body (10 MiB).
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 << 20;

/// Minimum login length.
pub const MIN_LOGIN_LEN: usize = 8;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;
