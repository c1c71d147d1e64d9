//! Client strategies.
//!
//! [`AuthenticatedClient`] and [`CachingAuthenticatedClient`] are two named
//! strategies behind one [`HttpClient`] interface. Callers receive an
//! `Arc<dyn HttpClient>` from [`build_client`] and never depend on which one the
//! configuration selected.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::AuthInterceptor;
use crate::cache::{CacheInterceptor, ResponseCache};
use crate::clock::{Clock, SystemClock};
use crate::config::{ClientConfig, ClientStrategy};
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::navigator::Navigator;
use crate::pipeline::Pipeline;
use crate::request::{ApiResponse, OutboundRequest};

/// Services a client depends on, injected explicitly so each client (and each
/// test) can have its own isolated session state.
#[derive(Clone)]
pub struct ClientContext {
    pub credentials: Arc<dyn CredentialStore>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
}

impl ClientContext {
    pub fn new(credentials: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            credentials,
            navigator,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// A client for the portal backend.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request through the interceptor pipeline.
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse>;

    /// Which strategy this client implements.
    fn strategy(&self) -> ClientStrategy;

    /// Ends the session: deletes the stored credential and drops any state
    /// derived from it. Returns `true` if a credential was present.
    fn logout(&self) -> Result<bool>;

    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(OutboundRequest::get(path)).await
    }

    async fn get_with_query(&self, path: &str, query: &[(String, String)]) -> Result<ApiResponse> {
        let mut request = OutboundRequest::get(path);
        request.query = query.to_vec();
        self.send(request).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(OutboundRequest::post(path, body)).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(OutboundRequest::put(path, body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(OutboundRequest::patch(path, body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(OutboundRequest::delete(path)).await
    }
}

/// Attaches the bearer credential and handles 401 with purge + redirect.
pub struct AuthenticatedClient {
    pipeline: Pipeline,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthenticatedClient {
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(config: &ClientConfig, ctx: ClientContext) -> Result<Self> {
        let auth = AuthInterceptor::new(
            ctx.credentials.clone(),
            ctx.navigator.clone(),
            config.login_route.clone(),
        );
        let pipeline = Pipeline::new(config)?.with_interceptor(Arc::new(auth));

        Ok(Self {
            pipeline,
            credentials: ctx.credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        self.pipeline.base_url()
    }
}

#[async_trait]
impl HttpClient for AuthenticatedClient {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse> {
        self.pipeline.execute(request).await
    }

    fn strategy(&self) -> ClientStrategy {
        ClientStrategy::Plain
    }

    fn logout(&self) -> Result<bool> {
        self.credentials.clear()
    }
}

/// [`AuthenticatedClient`] behavior plus a TTL response cache for reads.
pub struct CachingAuthenticatedClient {
    pipeline: Pipeline,
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<ResponseCache>,
}

impl CachingAuthenticatedClient {
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(config: &ClientConfig, ctx: ClientContext) -> Result<Self> {
        let cache = Arc::new(ResponseCache::new(config.cache.ttl(), ctx.clock.clone()));
        let auth = AuthInterceptor::new(
            ctx.credentials.clone(),
            ctx.navigator.clone(),
            config.login_route.clone(),
        );
        let caching = CacheInterceptor::new(cache.clone(), config.cache.clone());

        // Auth first: the cache scopes itself by the attached credential.
        let pipeline = Pipeline::new(config)?
            .with_interceptor(Arc::new(auth))
            .with_interceptor(Arc::new(caching));

        Ok(Self {
            pipeline,
            credentials: ctx.credentials,
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        self.pipeline.base_url()
    }
}

#[async_trait]
impl HttpClient for CachingAuthenticatedClient {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse> {
        self.pipeline.execute(request).await
    }

    fn strategy(&self) -> ClientStrategy {
        ClientStrategy::Caching
    }

    fn logout(&self) -> Result<bool> {
        self.cache.invalidate_session();
        self.credentials.clear()
    }
}

/// Builds the client selected by `config.strategy`.
///
/// # Errors
///
/// Returns an error if the base URL is invalid or the HTTP client cannot be
/// built.
pub fn build_client(config: &ClientConfig, ctx: ClientContext) -> Result<Arc<dyn HttpClient>> {
    tracing::debug!(strategy = ?config.strategy, base_url = %config.base_url, "Building portal client");
    let client: Arc<dyn HttpClient> = match config.strategy {
        ClientStrategy::Plain => Arc::new(AuthenticatedClient::new(config, ctx)?),
        ClientStrategy::Caching => Arc::new(CachingAuthenticatedClient::new(config, ctx)?),
    };
    Ok(client)
}
