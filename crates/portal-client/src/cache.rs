//! Time-boxed in-memory response cache.
//!
//! This module provides:
//!
//! - [`CacheKey`] - Deterministic fingerprint of a request's identity
//! - [`ResponseCache`] - TTL-bounded store of prior responses
//! - [`CacheInterceptor`] - Pipeline hook that answers repeated reads from the
//!   cache and records fresh responses
//!
//! # Eviction
//!
//! Eviction is purely time-based. An entry older than the TTL is removed the
//! next time it is looked up, or by [`ResponseCache::cleanup`]. There is no size
//! bound and no LRU.
//!
//! # Session scoping
//!
//! The cache remembers which credential populated it. A request carrying a
//! different `Authorization` header (including none at all) flushes the cache
//! before the lookup. Every entry is stamped with the session it was fetched
//! under, and a response that completes after the session changed (or after a
//! 401 unbound it) is dropped instead of stored, so one user's responses are
//! never served to another.
//!
//! # Concurrency
//!
//! Identical requests issued concurrently are not coalesced: each misses, each
//! hits the network, and the last response written wins.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use reqwest::header::AUTHORIZATION;
use time::OffsetDateTime;

use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::error::ClientError;
use crate::pipeline::{Interceptor, RequestFlow};
use crate::request::{ApiResponse, OutboundRequest, ResponseSource};

/// Identity of a request for caching purposes.
///
/// Derived from method, path, query parameters (in order) and body. Equal keys
/// mean "the same operation"; this is plain value equality. Bodies go through
/// `serde_json::Value`, whose object map is ordered, so two bodies differing
/// only in key order share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_request(request: &OutboundRequest) -> Self {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(request.query.iter())
            .finish();
        let body = request
            .body
            .as_ref()
            .map(|b| b.to_string())
            .unwrap_or_default();

        Self(format!(
            "{}|{}|{}|{}",
            request.method, request.path, query, body
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A memoized response, the time it was stored and the session it belongs to.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: ApiResponse,
    pub stored_at: OffsetDateTime,
    pub session: Option<u64>,
}

/// Result of looking a key up.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Entry younger than the TTL.
    Fresh(ApiResponse),
    /// Entry was present but stale and has been evicted.
    Expired,
    Missing,
}

/// In-memory response cache.
pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    /// Fingerprint of the credential that populated the current entries.
    session: Mutex<Option<u64>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
            session: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: OffsetDateTime) -> bool {
        let age = now - entry.stored_at;
        // A clock that moved backwards yields a negative age, still fresh.
        age.whole_milliseconds() < self.ttl.as_millis() as i128
    }

    fn session_guard(&self) -> MutexGuard<'_, Option<u64>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fingerprint of the session the cache is currently bound to.
    pub fn session(&self) -> Option<u64> {
        *self.session_guard()
    }

    /// Looks a key up, evicting the entry if it has expired.
    ///
    /// An entry stamped with another session is evicted and reported missing.
    pub fn lookup(&self, key: &CacheKey) -> CacheLookup {
        let now = self.clock.now();
        let session = self.session();

        let (lookup, evict) = match self.entries.get(key) {
            Some(entry) if entry.session != session => (CacheLookup::Missing, true),
            Some(entry) if self.is_fresh(&entry, now) => {
                let mut response = entry.response.clone();
                response.source = ResponseSource::Cache;
                (CacheLookup::Fresh(response), false)
            }
            Some(_) => (CacheLookup::Expired, true),
            None => (CacheLookup::Missing, false),
        };

        if evict {
            self.entries.remove(key);
        }

        lookup
    }

    /// Stores a response under `key` for the current session, replacing any
    /// previous entry.
    pub fn insert(&self, key: CacheKey, response: &ApiResponse) {
        let session = self.session_guard();
        self.store(key, *session, response);
    }

    /// Stores a response fetched under `session`, unless the cache has since
    /// been bound to a different session. Returns `true` if it was stored.
    pub fn insert_for_session(
        &self,
        key: CacheKey,
        session: Option<u64>,
        response: &ApiResponse,
    ) -> bool {
        let current = self.session_guard();
        if *current != session {
            return false;
        }
        self.store(key, session, response);
        true
    }

    // Callers hold the session lock so a concurrent rebind cannot interleave.
    fn store(&self, key: CacheKey, session: Option<u64>, response: &ApiResponse) {
        let mut response = response.clone();
        response.source = ResponseSource::Network;
        self.entries.insert(
            key,
            CacheEntry {
                response,
                stored_at: self.clock.now(),
                session,
            },
        );
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Clears all expired entries from the cache.
    pub fn cleanup(&self) {
        let now = self.clock.now();
        let before_count = self.entries.len();

        self.entries.retain(|_, entry| self.is_fresh(entry, now));

        let removed = before_count.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!("Cleaned up {} expired response cache entries", removed);
        }
    }

    /// Clears all entries from the cache.
    pub fn clear(&self) {
        self.entries.clear();
        tracing::debug!("Cleared all response cache entries");
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ties the cache to a session fingerprint, flushing it when the session
    /// changed. Returns `true` if entries were dropped.
    pub fn bind_session(&self, session: Option<u64>) -> bool {
        let mut current = self.session_guard();
        if *current == session {
            return false;
        }
        *current = session;
        let had_entries = !self.entries.is_empty();
        self.clear();
        had_entries
    }

    /// Flushes the cache and unbinds it from any session, so responses still
    /// in flight for the old credential are not stored.
    pub fn invalidate_session(&self) {
        let mut current = self.session_guard();
        *current = None;
        self.clear();
    }
}

/// Fingerprint of the credential carried by a request, if any.
fn session_fingerprint(request: &OutboundRequest) -> Option<u64> {
    request.headers.get(AUTHORIZATION).map(|value| {
        let mut hasher = DefaultHasher::new();
        value.as_bytes().hash(&mut hasher);
        hasher.finish()
    })
}

/// Pipeline hook backed by a [`ResponseCache`].
///
/// Must be registered after the auth interceptor so the session fingerprint
/// sees the attached credential.
pub struct CacheInterceptor {
    cache: Arc<ResponseCache>,
    config: CacheConfig,
}

impl CacheInterceptor {
    pub fn new(cache: Arc<ResponseCache>, config: CacheConfig) -> Self {
        Self { cache, config }
    }

    fn is_cacheable(&self, request: &OutboundRequest) -> bool {
        self.config.cache_mutations || request.is_idempotent_read()
    }
}

impl Interceptor for CacheInterceptor {
    fn on_request(&self, request: &mut OutboundRequest) -> RequestFlow {
        if self.cache.bind_session(session_fingerprint(request)) {
            tracing::debug!("Session changed; response cache flushed");
        }

        if !self.is_cacheable(request) {
            return RequestFlow::Continue;
        }

        let key = CacheKey::from_request(request);
        match self.cache.lookup(&key) {
            CacheLookup::Fresh(response) => {
                tracing::trace!("Cache hit for {}", key);
                RequestFlow::Respond(response)
            }
            CacheLookup::Expired => {
                tracing::debug!("Evicted expired cache entry for {}", key);
                RequestFlow::Continue
            }
            CacheLookup::Missing => {
                tracing::trace!("Cache miss for {}", key);
                RequestFlow::Continue
            }
        }
    }

    fn on_response(&self, request: &OutboundRequest, response: &ApiResponse) {
        if !request.is_idempotent_read() && self.config.invalidate_on_write {
            tracing::debug!(method = %request.method, path = %request.path, "Mutation succeeded; flushing response cache");
            self.cache.clear();
        }

        if self.is_cacheable(request) {
            let key = CacheKey::from_request(request);
            if !self
                .cache
                .insert_for_session(key.clone(), session_fingerprint(request), response)
            {
                tracing::debug!("Session changed while {} was in flight; not caching", key);
            }
        }
    }

    fn on_error(&self, _request: &OutboundRequest, error: &ClientError) {
        if error.is_unauthorized() {
            self.cache.invalidate_session();
        }
    }
}
