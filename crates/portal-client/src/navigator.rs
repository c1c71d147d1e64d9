//! Navigation side effect fired after an authentication failure.

use std::sync::Mutex;

/// Performs a hard navigation to a route outside the application's own routing.
///
/// A browser host would do a full page load. The CLI prints a re-login hint.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Navigator that only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        tracing::warn!(route, "Session ended, redirecting to login");
    }
}

/// Navigator that remembers every redirect it was asked to perform.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All redirect targets, oldest first.
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.routes.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route.to_string());
        }
    }
}
