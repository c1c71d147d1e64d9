use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::credentials::CredentialStore;
use crate::error::ClientError;
use crate::navigator::Navigator;
use crate::pipeline::{Interceptor, RequestFlow};
use crate::request::OutboundRequest;

/// Attaches the session credential and handles authentication failures.
///
/// On every request the stored token, if any, becomes an
/// `Authorization: Bearer <token>` header. When the backend answers 401 the
/// credential is deleted and the navigator is sent to the login route. There is
/// no silent refresh; the caller still receives the 401.
pub struct AuthInterceptor {
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl AuthInterceptor {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            navigator,
            login_route: login_route.into(),
        }
    }
}

impl Interceptor for AuthInterceptor {
    fn on_request(&self, request: &mut OutboundRequest) -> RequestFlow {
        // A broken store degrades to an anonymous request.
        let token = match self.credentials.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session credential");
                None
            }
        };

        if let Some(token) = token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    request.headers.insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    tracing::warn!("Stored credential is not a valid header value; sending unauthenticated");
                }
            }
        }

        RequestFlow::Continue
    }

    fn on_error(&self, request: &OutboundRequest, error: &ClientError) {
        if !error.is_unauthorized() {
            return;
        }

        tracing::info!(
            method = %request.method,
            path = %request.path,
            "Backend rejected credential; ending session"
        );

        if let Err(e) = self.credentials.clear() {
            tracing::warn!(error = %e, "Failed to delete session credential");
        }
        self.navigator.redirect(&self.login_route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::navigator::RecordingNavigator;

    fn interceptor(
        token: Option<&str>,
    ) -> (
        AuthInterceptor,
        Arc<MemoryCredentialStore>,
        Arc<RecordingNavigator>,
    ) {
        let store = Arc::new(match token {
            Some(t) => MemoryCredentialStore::with_token(t),
            None => MemoryCredentialStore::new(),
        });
        let nav = Arc::new(RecordingNavigator::new());
        let auth = AuthInterceptor::new(store.clone(), nav.clone(), "/client-login");
        (auth, store, nav)
    }

    #[test]
    fn test_attaches_bearer_token() {
        let (auth, _, _) = interceptor(Some("T"));
        let mut req = OutboundRequest::get("/clients");

        assert_eq!(auth.on_request(&mut req), RequestFlow::Continue);
        assert_eq!(req.headers.get(AUTHORIZATION).unwrap(), "Bearer T");
    }

    #[test]
    fn test_no_token_no_header() {
        let (auth, _, _) = interceptor(None);
        let mut req = OutboundRequest::get("/clients");

        auth.on_request(&mut req);
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_token_sends_unauthenticated() {
        let (auth, _, _) = interceptor(Some("bad\ntoken"));
        let mut req = OutboundRequest::get("/clients");

        auth.on_request(&mut req);
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_unauthorized_purges_and_redirects() {
        let (auth, store, nav) = interceptor(Some("T"));
        let req = OutboundRequest::get("/projects/1");

        auth.on_error(
            &req,
            &ClientError::Unauthorized {
                body: String::new(),
            },
        );

        assert_eq!(store.load().unwrap(), None);
        assert_eq!(nav.routes(), vec!["/client-login"]);
    }

    #[test]
    fn test_other_errors_leave_session_alone() {
        let (auth, store, nav) = interceptor(Some("T"));
        let req = OutboundRequest::get("/projects/1");

        auth.on_error(
            &req,
            &ClientError::Http {
                status: 403,
                body: String::new(),
            },
        );

        assert_eq!(store.load().unwrap().as_deref(), Some("T"));
        assert!(nav.routes().is_empty());
    }
}
