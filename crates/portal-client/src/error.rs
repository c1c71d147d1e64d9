use thiserror::Error;

/// Errors surfaced to callers of the portal HTTP client.
///
/// Everything except [`ClientError::Unauthorized`] is passed through exactly as
/// the transport or backend produced it. A 401 is still returned to the caller,
/// but only after the session credential has been purged and the login redirect
/// has fired.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP 401 Unauthorized: {body}")]
    Unauthorized { body: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Credential store error: {0}")]
    Credential(String),
}

impl ClientError {
    /// Create a new Credential error
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    /// Check if this error is an authentication failure (HTTP 401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status carried by this error, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Http { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Url(_) | Self::Credential(_) => None,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Unauthorized {
            body: "token expired".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 401 Unauthorized: token expired");

        let err = ClientError::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");

        let err = ClientError::credential("disk full");
        assert_eq!(err.to_string(), "Credential store error: disk full");
    }

    #[test]
    fn test_status_and_predicates() {
        let err = ClientError::Unauthorized {
            body: String::new(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));

        let err = ClientError::Http {
            status: 404,
            body: String::new(),
        };
        assert!(!err.is_unauthorized());
        assert_eq!(err.status(), Some(404));

        assert_eq!(ClientError::credential("x").status(), None);
    }
}
