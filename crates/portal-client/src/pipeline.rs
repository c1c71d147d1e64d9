//! Interceptor pipeline shared by every client strategy.
//!
//! A call moves through three phases:
//!
//! 1. **Request phase**: interceptors run in registration order and may enrich
//!    the [`OutboundRequest`] or answer it directly with
//!    [`RequestFlow::Respond`]. The first interceptor that responds ends the
//!    call; nothing goes over the network.
//! 2. **Dispatch**: the request is sent with reqwest and the body decoded.
//! 3. **Response phase**: on success every interceptor sees the response, on
//!    failure every interceptor sees the error. The outcome is then returned
//!    to the caller unchanged.
//!
//! There is no retry, no backoff and no coalescing of identical in-flight
//! requests.

use std::sync::Arc;
use std::time::Instant;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::request::{ApiResponse, OutboundRequest};

const JSON: &str = "application/json";

/// Outcome of an interceptor's request phase.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestFlow {
    /// Hand the request to the next interceptor, then the network.
    Continue,
    /// Answer the call with this response and skip the network.
    Respond(ApiResponse),
}

/// A hook applied uniformly to every call made through a pipeline.
pub trait Interceptor: Send + Sync {
    fn on_request(&self, _request: &mut OutboundRequest) -> RequestFlow {
        RequestFlow::Continue
    }

    fn on_response(&self, _request: &OutboundRequest, _response: &ApiResponse) {}

    fn on_error(&self, _request: &OutboundRequest, _error: &ClientError) {}
}

/// Ordered interceptors in front of a reqwest transport.
pub struct Pipeline {
    http: reqwest::Client,
    base_url: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Pipeline {
    /// Creates an empty pipeline for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            interceptors: Vec::new(),
        })
    }

    /// Appends an interceptor to the end of the chain.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a backend path.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Ok(Url::parse(&url)?)
    }

    /// Runs a request through the interceptors and, unless one of them
    /// answers it, the network.
    pub async fn execute(&self, mut request: OutboundRequest) -> Result<ApiResponse> {
        request
            .headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(JSON));
        request
            .headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static(JSON));

        for interceptor in &self.interceptors {
            if let RequestFlow::Respond(response) = interceptor.on_request(&mut request) {
                return Ok(response);
            }
        }

        let result = self.dispatch(&request).await;

        match &result {
            Ok(response) => {
                for interceptor in &self.interceptors {
                    interceptor.on_response(&request, response);
                }
            }
            Err(error) => {
                for interceptor in &self.interceptors {
                    interceptor.on_error(&request, error);
                }
            }
        }

        result
    }

    async fn dispatch(&self, request: &OutboundRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path)?;
        let start = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| {
            tracing::debug!(method = %request.method, path = %request.path, error = %e, "Request failed");
            ClientError::from(e)
        })?;
        let status = resp.status();
        let body = resp.text().await?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            elapsed = ?start.elapsed(),
            "Request completed"
        );

        handle_response(status, body)
    }
}

/// Maps a raw status and body onto the caller contract.
fn handle_response(status: StatusCode, body: String) -> Result<ApiResponse> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized { body });
    }

    if !status.is_success() {
        return Err(ClientError::Http {
            status: status.as_u16(),
            body,
        });
    }

    if body.trim().is_empty() {
        return Ok(ApiResponse::from_network(status.as_u16(), Value::Null));
    }

    let data = serde_json::from_str(&body).map_err(|source| ClientError::Decode {
        status: status.as_u16(),
        source,
    })?;
    Ok(ApiResponse::from_network(status.as_u16(), data))
}
