//! App state: config, auth service, document service and their caches.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docvault_auth::{AuthService, SessionRegistry};
use docvault_cache::{CacheConfig, CacheStats, ExpiringCache, Sweeper};
use docvault_core::constants::DEFAULT_UPLOAD_LIMIT_BYTES;
use docvault_core::error::{Result, VaultError};
use docvault_core::traits::{DocumentStore, UserStore};
use docvault_core::types::Caller;
use docvault_documents::{CachedValue, DocumentCache, DocumentService};
use docvault_store::MemoryStore;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Token required to register users; registration is closed without it
    pub admin_token: Option<String>,
    /// Timings and capacity shared by the session and document caches
    pub cache: CacheConfig,
    /// Largest accepted upload body
    pub upload_limit_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_token: None,
            cache: CacheConfig::default(),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
        }
    }
}

impl ApiConfig {
    /// Reads the configuration from the environment (and `.env`, if present).
    ///
    /// | variable | default |
    /// |----------|---------|
    /// | `ADMIN_TOKEN` | unset |
    /// | `DOCVAULT_CACHE_TTL_SECS` | 300 |
    /// | `DOCVAULT_SWEEP_INTERVAL_SECS` | 600 |
    /// | `DOCVAULT_CACHE_MAX_ENTRIES` | 0 (unbounded) |
    /// | `DOCVAULT_UPLOAD_LIMIT_BYTES` | 10 MiB |
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let cache = CacheConfig {
            default_ttl: Duration::from_secs(env_or(
                "DOCVAULT_CACHE_TTL_SECS",
                defaults.cache.default_ttl.as_secs(),
            )?),
            sweep_interval: Duration::from_secs(env_or(
                "DOCVAULT_SWEEP_INTERVAL_SECS",
                defaults.cache.sweep_interval.as_secs(),
            )?),
            max_entries: env_or("DOCVAULT_CACHE_MAX_ENTRIES", defaults.cache.max_entries)?,
            ..defaults.cache
        };
        cache.validate()?;

        Ok(Self {
            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            cache,
            upload_limit_bytes: env_or("DOCVAULT_UPLOAD_LIMIT_BYTES", defaults.upload_limit_bytes)?,
        })
    }

    /// Sets the admin token.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| VaultError::invalid_input(format!("{name} is not a valid number: '{raw}'"))),
        Err(_) => Ok(default),
    }
}

/// Shared state behind every handler.
pub struct AppState {
    /// Server configuration
    pub config: ApiConfig,
    /// Registration, login and token resolution
    pub auth: AuthService,
    /// Read-through document operations
    pub documents: DocumentService,
    sessions: Arc<ExpiringCache<Caller>>,
    cache: Arc<ExpiringCache<CachedValue>>,
    started_at: Instant,
}

impl AppState {
    /// Creates state backed by a fresh in-memory store.
    pub fn new(config: ApiConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }

    /// Creates state over the given stores.
    pub fn with_stores(
        config: ApiConfig,
        users: Arc<dyn UserStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let sessions = Arc::new(ExpiringCache::with_config(config.cache.clone()));
        let cache = Arc::new(ExpiringCache::with_config(config.cache.clone()));

        let auth = AuthService::new(
            users.clone(),
            SessionRegistry::new(sessions.clone()),
            config.admin_token.clone(),
        );
        let documents =
            DocumentService::new(documents, users, Arc::new(DocumentCache::new(cache.clone())));

        Self {
            config,
            auth,
            documents,
            sessions,
            cache,
            started_at: Instant::now(),
        }
    }

    /// Spawns one background sweeper per cache.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_sweepers(&self) -> Vec<Sweeper> {
        vec![Sweeper::spawn(&self.sessions), Sweeper::spawn(&self.cache)]
    }

    /// Session cache statistics.
    pub fn session_stats(&self) -> CacheStats {
        self.sessions.stats()
    }

    /// Document cache statistics.
    pub fn document_cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Time since the state was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
