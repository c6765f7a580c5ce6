//! Error type definitions
//!
//! Defines the error taxonomy shared by the pipeline, the session manager
//! and the action builders.

use crate::session::LoginMode;
use thiserror::Error;

/// API error codes that mean the server no longer accepts our token or
/// login state. These trigger a single recovery attempt per call.
const REJECTION_CODES: &[&str] = &[
    "badtoken",
    "notloggedin",
    "assertuserfailed",
    "assertbotfailed",
    "assertnameduserfailed",
];

/// Main error type for the MediaWiki client
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection, TLS, timeout or other HTTP client failures
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller's cancellation token fired while a request was in flight
    #[error("Request cancelled")]
    Cancelled,

    /// Response body was not valid JSON or did not fit the expected shape
    #[error("Decode error: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    /// Well-formed envelope carrying an `error` object
    #[error("API error: {code}: {info}")]
    Api {
        code: String,
        info: String,
        raw: String,
    },

    /// Login was transported and decoded but reported a non-success status
    #[error("Login failed ({mode}): {status}{}: {message}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Login {
        mode: LoginMode,
        status: String,
        code: Option<String>,
        message: String,
        raw: String,
    },

    /// Session could not be re-established
    #[error("Keep-alive failed: {reason}")]
    KeepAlive { reason: String },

    /// Envelope had neither an error nor the payload the action expects
    #[error("Unexpected response from {action}")]
    UnexpectedResponse { action: String, raw: String },

    /// Action payload present but with a non-success result
    #[error("{action} returned {result}")]
    ActionFailed {
        action: String,
        result: String,
        raw: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a keep-alive error
    pub fn keep_alive(reason: impl Into<String>) -> Self {
        Self::KeepAlive {
            reason: reason.into(),
        }
    }

    /// Create an unexpected response error
    pub fn unexpected(action: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            action: action.into(),
            raw: raw.into(),
        }
    }

    /// Machine-readable API error code, if this is an API error
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Whether the server rejected our token or login state
    pub fn is_token_rejection(&self) -> bool {
        self.api_code()
            .is_some_and(|code| REJECTION_CODES.contains(&code))
    }

    /// Raw response text received before the failure, when there was one
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Decode { raw, .. }
            | Self::Api { raw, .. }
            | Self::Login { raw, .. }
            | Self::UnexpectedResponse { raw, .. }
            | Self::ActionFailed { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str) -> Error {
        Error::Api {
            code: code.to_string(),
            info: "info".to_string(),
            raw: "{}".to_string(),
        }
    }

    #[test]
    fn test_error_creation() {
        let err = Error::config("test config error");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: test config error");
    }

    #[test]
    fn test_api_error_display() {
        let err = api("badtitle");
        assert_eq!(err.to_string(), "API error: badtitle: info");
        assert_eq!(err.api_code(), Some("badtitle"));
    }

    #[test]
    fn test_token_rejection() {
        assert!(api("badtoken").is_token_rejection());
        assert!(api("assertbotfailed").is_token_rejection());
        assert!(!api("missingtitle").is_token_rejection());
        assert!(!Error::Cancelled.is_token_rejection());
    }

    #[test]
    fn test_decode_error_keeps_raw() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = Error::Decode {
            source,
            raw: "<html>".to_string(),
        };
        assert_eq!(err.raw(), Some("<html>"));
        assert!(err.to_string().starts_with("Decode error"));
    }

    #[test]
    fn test_login_error_display() {
        let err = Error::Login {
            mode: LoginMode::Interactive,
            status: "FAIL".to_string(),
            code: Some("wrongpassword".to_string()),
            message: "Incorrect password".to_string(),
            raw: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "Login failed (interactive): FAIL (wrongpassword): Incorrect password"
        );
    }

    #[test]
    fn test_keep_alive_error() {
        let err = Error::keep_alive("login rejected");
        assert!(matches!(err, Error::KeepAlive { .. }));
        assert!(err.raw().is_none());
        assert!(err.to_string().contains("Keep-alive failed"));
    }
}
