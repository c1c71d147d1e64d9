//! Client configuration.
//!
//! The backend base URL defaults to the `PORTAL_API_URL` value captured at build
//! time, falling back to the local development API. Everything else has a
//! built-in default and can be overridden through serde (the CLI stores these in
//! its profile file) or the `with_*` builders.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base URL used when neither the build nor the runtime overrides it.
pub const FALLBACK_BASE_URL: &str = "http://localhost:5000/api";

/// Route the client navigates to after an authentication failure.
pub const DEFAULT_LOGIN_ROUTE: &str = "/client-login";

/// Default time-to-live of cached responses (5 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Base URL baked in at build time, if any.
pub fn default_base_url() -> String {
    option_env!("PORTAL_API_URL")
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_BASE_URL)
        .to_string()
}

/// Which `HttpClient` implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStrategy {
    /// Bearer token injection and 401 handling only.
    #[default]
    Plain,
    /// Plain behavior plus the in-memory response cache.
    Caching,
}

impl std::str::FromStr for ClientStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "caching" | "cache" => Ok(Self::Caching),
            other => Err(format!(
                "Unknown client strategy: {other}. Valid values: plain, caching"
            )),
        }
    }
}

/// Response cache behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries older than this are evicted on lookup.
    pub ttl_secs: u64,
    /// Also cache responses to POST/PUT/PATCH/DELETE. Off by default because a
    /// mutation response can be served back to a later read with the same key.
    pub cache_mutations: bool,
    /// Flush the whole cache after any successful mutation.
    pub invalidate_on_write: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_mutations: false,
            invalidate_on_write: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Configuration for building a portal client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub strategy: ClientStrategy,
    pub login_route: String,
    /// Request timeout in milliseconds. `None` or zero keeps the transport
    /// default.
    pub timeout_ms: Option<u64>,
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            strategy: ClientStrategy::default(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            timeout_ms: None,
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Selects the client strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: ClientStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the route used for the login redirect.
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Sets an explicit request timeout. A zero duration clears it; anything
    /// shorter than a millisecond rounds up to one.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = if timeout.is_zero() {
            None
        } else {
            Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1))
        };
        self
    }

    /// Replaces the cache settings.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, default_base_url());
        assert_eq!(config.strategy, ClientStrategy::Plain);
        assert_eq!(config.login_route, "/client-login");
        assert_eq!(config.timeout(), None);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert!(!config.cache.cache_mutations);
        assert!(config.cache.invalidate_on_write);
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_base_url("https://portal.example.com/api")
            .with_strategy(ClientStrategy::Caching)
            .with_login_route("/login")
            .with_timeout(Duration::from_secs(15))
            .with_cache(CacheConfig {
                ttl_secs: 60,
                ..Default::default()
            });

        assert_eq!(config.base_url, "https://portal.example.com/api");
        assert_eq!(config.strategy, ClientStrategy::Caching);
        assert_eq!(config.login_route, "/login");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.cache.ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_timeout_keeps_sub_second_precision() {
        let config = ClientConfig::new().with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));

        let config = ClientConfig::new().with_timeout(Duration::from_millis(1500));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));

        let config = ClientConfig::new().with_timeout(Duration::from_micros(200));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_zero_timeout_means_transport_default() {
        let config = ClientConfig::new().with_timeout(Duration::ZERO);
        assert_eq!(config.timeout_ms, None);
        assert_eq!(config.timeout(), None);

        let config: ClientConfig = serde_json::from_str(r#"{"timeout_ms": 0}"#).unwrap();
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"strategy": "caching", "cache": {"ttl_secs": 10}}"#).unwrap();
        assert_eq!(config.strategy, ClientStrategy::Caching);
        assert_eq!(config.cache.ttl_secs, 10);
        assert!(config.cache.invalidate_on_write);
        assert_eq!(config.login_route, DEFAULT_LOGIN_ROUTE);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("plain".parse::<ClientStrategy>(), Ok(ClientStrategy::Plain));
        assert_eq!("Caching".parse::<ClientStrategy>(), Ok(ClientStrategy::Caching));
        assert!("lru".parse::<ClientStrategy>().is_err());
    }
}
