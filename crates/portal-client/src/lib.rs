//! HTTP client layer for the agency portal backend.
//!
//! Every call goes through an interceptor [`pipeline`]. The
//! [`AuthenticatedClient`] attaches the session's bearer credential and, when
//! the backend answers 401, deletes the credential and redirects to the login
//! route. The [`CachingAuthenticatedClient`] adds a time-boxed response cache
//! for reads on top of that. Both implement [`HttpClient`]; [`build_client`]
//! picks one from [`ClientConfig::strategy`].
//!
//! Session state (the [`CredentialStore`], the [`Navigator`] and the cache
//! clock) is injected through [`ClientContext`] rather than held in globals.
//!
//! ```no_run
//! use std::sync::Arc;
//! use portal_client::{
//!     ClientConfig, ClientContext, ClientStrategy, HttpClient, LogNavigator,
//!     MemoryCredentialStore, build_client,
//! };
//!
//! # async fn run() -> portal_client::Result<()> {
//! let ctx = ClientContext::new(
//!     Arc::new(MemoryCredentialStore::with_token("abc123")),
//!     Arc::new(LogNavigator),
//! );
//! let client = build_client(&ClientConfig::default().with_strategy(ClientStrategy::Caching), ctx)?;
//! let clients = client.get("/clients").await?;
//! println!("{}", clients.data);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod navigator;
pub mod pipeline;
pub mod request;

pub use auth::AuthInterceptor;
pub use cache::{CacheEntry, CacheInterceptor, CacheKey, CacheLookup, ResponseCache};
pub use catalog::{CatalogError, CatalogStore, Estimate, Feature, FeatureCatalog, Service};
pub use client::{
    AuthenticatedClient, CachingAuthenticatedClient, ClientContext, HttpClient, build_client,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, ClientConfig, ClientStrategy};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ClientError, Result};
pub use navigator::{LogNavigator, Navigator, RecordingNavigator};
pub use pipeline::{Interceptor, Pipeline, RequestFlow};
pub use request::{ApiResponse, OutboundRequest, ResponseSource};
pub use reqwest::Method;
