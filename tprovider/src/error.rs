//! Provider error taxonomy and the structured error body returned by the chat endpoint.
//!
//! The `error_type` string is the discriminator the UI layer keys on; it is carried through
//! every layer unaltered.
//!
//! ```rust
//! use tprovider::{ErrorBody, ProviderError, ProviderErrorKind};
//!
//! let body = ErrorBody::parse(r#"{"type":"gemini_error_429","message":"quota"}"#);
//! let error = ProviderError::from_response(429, body);
//! assert_eq!(error.kind, ProviderErrorKind::RateLimited);
//! assert_eq!(error.error_type, "gemini_error_429");
//! assert!(error.is_rate_limit());
//!
//! let garbage = ErrorBody::parse("<html>bad gateway</html>");
//! assert_eq!(garbage.error_type, "unknown_error");
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Discriminator strings found in the `type` field of error bodies.
pub mod error_types {
    pub const MISSING_API_KEY: &str = "missing_api_key";
    pub const INVALID_API_KEY: &str = "invalid_api_key";
    pub const RATE_LIMIT_ERROR: &str = "rate_limit_error";
    pub const GEMINI_ERROR_429: &str = "gemini_error_429";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const INVALID_REQUEST_ERROR: &str = "invalid_request_error";
    pub const OVERLOADED_ERROR: &str = "overloaded_error";
    pub const UNKNOWN_ERROR: &str = "unknown_error";

    /// Types that mean "rate limited" regardless of the HTTP status they arrived with.
    pub const RATE_LIMIT_TYPES: [&str; 2] = [RATE_LIMIT_ERROR, GEMINI_ERROR_429];
}

use error_types::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ErrorBody {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            error_code: None,
        }
    }

    pub fn with_error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_ERROR, "an unknown error occurred")
    }

    /// Parses a non-2xx response body, substituting [`ErrorBody::unknown`] when the body is
    /// not a structured error.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self::unknown())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    MissingCredential,
    Authentication,
    RateLimited,
    InvalidRequest,
    Overloaded,
    Upstream,
    Transport,
    Other,
}

impl ProviderErrorKind {
    /// Maps an HTTP status and error type onto a kind. Rate limiting wins over every other
    /// signal so that a 429 is never misfiled.
    pub fn classify(status: Option<u16>, error_type: &str) -> Self {
        if status == Some(429) || RATE_LIMIT_TYPES.contains(&error_type) {
            return Self::RateLimited;
        }

        match error_type {
            MISSING_API_KEY => return Self::MissingCredential,
            INVALID_API_KEY | AUTHENTICATION_ERROR => return Self::Authentication,
            OVERLOADED_ERROR => return Self::Overloaded,
            INVALID_REQUEST_ERROR => return Self::InvalidRequest,
            _ => {}
        }

        match status {
            Some(401) | Some(403) => Self::Authentication,
            Some(529) => Self::Overloaded,
            Some(code) if (400..500).contains(&code) => Self::InvalidRequest,
            Some(code) if code >= 500 => Self::Upstream,
            _ => Self::Other,
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Overloaded | Self::Upstream | Self::Transport
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub error_type: String,
    pub message: String,
    pub error_code: Option<String>,
    pub status: Option<u16>,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(
        kind: ProviderErrorKind,
        error_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            error_type: error_type.into(),
            message: message.into(),
            error_code: None,
            status: None,
            retryable: kind.is_retryable(),
        }
    }

    /// Builds the error for a non-2xx response from the chat endpoint.
    pub fn from_response(status: u16, body: ErrorBody) -> Self {
        let kind = ProviderErrorKind::classify(Some(status), &body.error_type);

        Self {
            kind,
            error_type: body.error_type,
            message: body.message,
            error_code: body.error_code,
            status: Some(status),
            retryable: kind.is_retryable(),
        }
    }

    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MissingCredential, MISSING_API_KEY, message)
    }

    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, INVALID_API_KEY, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, RATE_LIMIT_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, INVALID_REQUEST_ERROR, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, UNKNOWN_ERROR, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, UNKNOWN_ERROR, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// True for a 429 status or any rate-limit error type.
    pub fn is_rate_limit(&self) -> bool {
        self.kind == ProviderErrorKind::RateLimited
            || self.status == Some(429)
            || RATE_LIMIT_TYPES.contains(&self.error_type.as_str())
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error_type: self.error_type.clone(),
            message: self.message.clone(),
            error_code: self.error_code.clone(),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl Error for ProviderError {}

impl From<serde_json::Error> for ProviderError {
    fn from(value: serde_json::Error) -> Self {
        Self::other(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prefers_rate_limit_over_other_signals() {
        assert_eq!(
            ProviderErrorKind::classify(Some(429), AUTHENTICATION_ERROR),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            ProviderErrorKind::classify(Some(500), GEMINI_ERROR_429),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            ProviderErrorKind::classify(Some(401), MISSING_API_KEY),
            ProviderErrorKind::MissingCredential
        );
        assert_eq!(
            ProviderErrorKind::classify(Some(401), "api_error"),
            ProviderErrorKind::Authentication
        );
        assert_eq!(
            ProviderErrorKind::classify(Some(400), "api_error"),
            ProviderErrorKind::InvalidRequest
        );
        assert_eq!(
            ProviderErrorKind::classify(Some(502), UNKNOWN_ERROR),
            ProviderErrorKind::Upstream
        );
        assert_eq!(
            ProviderErrorKind::classify(Some(529), UNKNOWN_ERROR),
            ProviderErrorKind::Overloaded
        );
    }

    #[test]
    fn from_response_preserves_body_fields() {
        let body = ErrorBody::new(RATE_LIMIT_ERROR, "slow down").with_error_code("req_test123");
        let error = ProviderError::from_response(429, body.clone());

        assert_eq!(error.status, Some(429));
        assert_eq!(error.error_code.as_deref(), Some("req_test123"));
        assert!(error.retryable);
        assert_eq!(error.body(), body);
        assert_eq!(error.to_string(), "rate_limit_error: slow down");
    }

    #[test]
    fn error_body_parse_reads_camel_case_error_code() {
        let body = ErrorBody::parse(
            r#"{"type":"authentication_error","message":"bad key","errorCode":"req_1"}"#,
        );

        assert_eq!(body.error_type, AUTHENTICATION_ERROR);
        assert_eq!(body.error_code.as_deref(), Some("req_1"));
        assert_eq!(ErrorBody::parse("").error_type, UNKNOWN_ERROR);
        assert_eq!(ErrorBody::parse(r#"{"error":"nope"}"#).error_type, UNKNOWN_ERROR);
    }

    #[test]
    fn rate_limit_detection_uses_status_or_marker() {
        let by_status = ProviderError::new(ProviderErrorKind::Other, "weird", "x").with_status(429);
        let by_marker = ProviderError::new(ProviderErrorKind::Other, GEMINI_ERROR_429, "x");
        let auth = ProviderError::from_response(401, ErrorBody::new(AUTHENTICATION_ERROR, "x"));

        assert!(by_status.is_rate_limit());
        assert!(by_marker.is_rate_limit());
        assert!(!auth.is_rate_limit());
        assert!(!auth.retryable);
    }
}
