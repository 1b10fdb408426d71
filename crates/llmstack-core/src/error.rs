// ── Core error types ──
//
// Errors seen by consumers of the data layer. Transport failures arrive
// as `llmstack_api::Error` and are translated by the `From` impl below.
// Cache nodes never surface a `CoreError` on the read path; they keep a
// cloneable `CacheError` projection next to their default value instead.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {message}")]
    NotFound { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Live session errors ──────────────────────────────────────────
    #[error("Live session failed: {message}")]
    Live { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status the server answered with, when the error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<llmstack_api::Error> for CoreError {
    fn from(err: llmstack_api::Error) -> Self {
        match err {
            llmstack_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            llmstack_api::Error::Forbidden { message } => CoreError::Forbidden { message },
            llmstack_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            llmstack_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            llmstack_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            llmstack_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            llmstack_api::Error::Api { status: 404, message } => CoreError::NotFound { message },
            llmstack_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            llmstack_api::Error::WebSocketConnect(reason) => CoreError::Live {
                message: format!("WebSocket connection failed: {reason}"),
            },
            llmstack_api::Error::WebSocketClosed { code, reason } => CoreError::Live {
                message: format!("WebSocket closed (code {code}): {reason}"),
            },
            llmstack_api::Error::Protocol(message) => CoreError::Live { message },
            llmstack_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

// ── CacheError ───────────────────────────────────────────────────────

/// What a cache node remembers about its last failed fetch.
///
/// Cheap to clone so every snapshot of a node can carry it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CacheError {
    pub message: String,
    pub status: Option<u16>,
}

impl CacheError {
    /// Whether the failure means the caller has no valid session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, Some(401 | 403))
    }
}

impl From<&CoreError> for CacheError {
    fn from(err: &CoreError) -> Self {
        let message = match err {
            CoreError::AuthenticationFailed { message }
            | CoreError::Forbidden { message }
            | CoreError::NotFound { message }
            | CoreError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            message,
            status: err.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_api_errors_become_not_found() {
        let err = CoreError::from(llmstack_api::Error::Api {
            status: 404,
            message: "No such app".into(),
        });
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn cache_error_keeps_server_message_and_status() {
        let err = CoreError::from(llmstack_api::Error::Api {
            status: 500,
            message: "boom".into(),
        });
        let cached = CacheError::from(&err);
        assert_eq!(cached.message, "boom");
        assert_eq!(cached.status, Some(500));
        assert!(!cached.is_unauthorized());
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        let err = CoreError::from(llmstack_api::Error::Authentication {
            message: "expired".into(),
        });
        assert!(CacheError::from(&err).is_unauthorized());
    }
}
