//! Session tokens and the registry that resolves them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docvault_cache::ExpiringCache;
use docvault_core::constants::SESSION_TOKEN_BYTES;
use docvault_core::error::{Result, VaultError};
use docvault_core::types::Caller;

/// Opaque bearer credential.
///
/// `Debug` output is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a token from the operating system's secure RNG.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SESSION_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| VaultError::TokenGeneration(e.to_string()))?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Returns the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Maps session tokens to authenticated callers.
///
/// Sessions live for a fixed TTL from creation and are not refreshed on use.
/// Resolution never distinguishes an expired token from a revoked or
/// never-issued one: all three are simply absent.
pub struct SessionRegistry {
    cache: Arc<ExpiringCache<Caller>>,
    ttl: Duration,
}

impl SessionRegistry {
    /// Creates a registry over `cache`, using the cache's default TTL.
    pub fn new(cache: Arc<ExpiringCache<Caller>>) -> Self {
        let ttl = cache.default_ttl();
        Self { cache, ttl }
    }

    /// Creates a registry with an explicit session lifetime.
    pub fn with_ttl(cache: Arc<ExpiringCache<Caller>>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Opens a session for `caller` and returns its token.
    ///
    /// Fails only if the secure random source is unavailable.
    pub fn create_session(&self, caller: Caller) -> Result<SessionToken> {
        let token = SessionToken::generate()?;
        info!(user_id = %caller.id, "Session created");
        self.cache.set(token.as_str(), caller, self.ttl);
        Ok(token)
    }

    /// Resolves a token to its caller, if the session is live.
    pub fn resolve(&self, token: &str) -> Option<Caller> {
        let caller = self.cache.get(token);
        if caller.is_none() {
            debug!("Session lookup missed");
        }
        caller
    }

    /// Ends a session. Succeeds whether or not the token existed.
    pub fn revoke(&self, token: &str) {
        self.cache.delete(token);
        info!("Session revoked");
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
