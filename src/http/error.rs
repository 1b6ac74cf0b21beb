//! Failure classification for API calls.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::fmt;

/// Application code the backend returns for a stale or missing CSRF token.
pub const CSRF_INVALID_CODE: i64 = 574;
pub const CSRF_INVALID_MESSAGE: &str = "invalid csrf token";

/// JSON error payload returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parses a response body; anything that is not a JSON object yields `None`.
    ///
    /// `code` and `message` are read independently, so a mistyped field never
    /// hides the other one.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let Value::Object(object) = serde_json::from_slice::<Value>(body).ok()? else {
            return None;
        };
        Some(Self {
            code: object.get("code").and_then(Value::as_i64),
            message: object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    pub fn is_csrf_invalid(&self) -> bool {
        self.code == Some(CSRF_INVALID_CODE)
            && self.message.as_deref().map(str::trim) == Some(CSRF_INVALID_MESSAGE)
    }
}

/// What went wrong, as far as recovery is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Backend rejected the CSRF token (574)
    CsrfInvalid,
    /// HTTP 401
    Unauthorized,
    /// Any other non-2xx response carrying an application code
    Application(i64),
    /// Request was sent but no response came back
    Network,
    /// Everything else
    Unexpected,
}

/// Error returned by [`SessionClient`](super::SessionClient) calls.
#[derive(Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: Option<ErrorBody>,
    },
    /// The request was sent but no response was received.
    Network {
        method: Method,
        url: String,
        source: reqwest::Error,
    },
    /// The request could not be made at all.
    Unexpected(anyhow::Error),
}

impl ApiError {
    /// Wraps a transport error. Requests that never left the client are unexpected.
    pub fn from_transport(method: Method, url: String, source: reqwest::Error) -> Self {
        if source.is_builder() {
            ApiError::Unexpected(anyhow::Error::from(source))
        } else {
            ApiError::Network {
                method,
                url,
                source,
            }
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Status { status, body, .. } => {
                if body.as_ref().is_some_and(ErrorBody::is_csrf_invalid) {
                    FailureKind::CsrfInvalid
                } else if *status == StatusCode::UNAUTHORIZED {
                    FailureKind::Unauthorized
                } else if let Some(code) = body.as_ref().and_then(|b| b.code) {
                    FailureKind::Application(code)
                } else {
                    FailureKind::Unexpected
                }
            }
            ApiError::Network { .. } => FailureKind::Network,
            ApiError::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            ApiError::Status { body, .. } => body.as_ref().and_then(|b| b.code),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ApiError::Status { url, .. } | ApiError::Network { url, .. } => Some(url),
            ApiError::Unexpected(_) => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Status {
                method,
                url,
                status,
                body,
            } => {
                write!(f, "{} {} failed with HTTP {}", method, url, status.as_u16())?;
                if let Some(body) = body {
                    if let Some(code) = body.code {
                        write!(f, " (code {})", code)?;
                    }
                    if let Some(message) = &body.message {
                        write!(f, ": {}", message)?;
                    }
                }
                Ok(())
            }
            ApiError::Network { method, url, source } => {
                write!(f, "No response for {} {}: {}", method, url, source)
            }
            ApiError::Unexpected(err) => write!(f, "Request error: {}", err),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network { source, .. } => Some(source),
            ApiError::Unexpected(err) => Some(&**err),
            ApiError::Status { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16, body: Option<ErrorBody>) -> ApiError {
        ApiError::Status {
            method: Method::POST,
            url: "http://localhost/order".to_string(),
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }

    fn body(code: i64, message: &str) -> Option<ErrorBody> {
        Some(ErrorBody {
            code: Some(code),
            message: Some(message.to_string()),
        })
    }

    #[test]
    fn test_parse_error_body() {
        let body = ErrorBody::parse(br#"{"code": 1001, "message": "not found", "extra": 1}"#);
        assert_eq!(
            body,
            Some(ErrorBody {
                code: Some(1001),
                message: Some("not found".to_string())
            })
        );
        assert_eq!(ErrorBody::parse(b"<html>oops</html>"), None);
        assert_eq!(ErrorBody::parse(b"{}"), Some(ErrorBody::default()));
    }

    #[test]
    fn test_parse_keeps_code_when_message_is_a_list() {
        let body = ErrorBody::parse(br#"{"code": 1001, "message": ["name must not be empty"]}"#);
        assert_eq!(
            body,
            Some(ErrorBody {
                code: Some(1001),
                message: None
            })
        );
        assert_eq!(
            status_error(400, body).kind(),
            FailureKind::Application(1001)
        );
    }

    #[test]
    fn test_parse_rejects_non_object_json() {
        assert_eq!(ErrorBody::parse(br#"[1001, "x"]"#), None);
        assert_eq!(ErrorBody::parse(b"\"oops\""), None);
        assert_eq!(ErrorBody::parse(b"null"), None);
    }

    #[test]
    fn test_parse_ignores_mistyped_code() {
        let body = ErrorBody::parse(br#"{"code": "574", "message": "invalid csrf token"}"#).unwrap();
        assert_eq!(body.code, None);
        assert!(!body.is_csrf_invalid());
    }

    #[test]
    fn test_kind_csrf_invalid() {
        let err = status_error(574, body(574, "invalid csrf token"));
        assert_eq!(err.kind(), FailureKind::CsrfInvalid);

        // Status does not matter, only the application signal does
        let err = status_error(403, body(574, "invalid csrf token"));
        assert_eq!(err.kind(), FailureKind::CsrfInvalid);
    }

    #[test]
    fn test_kind_csrf_requires_message() {
        let err = status_error(574, body(574, "something else"));
        assert_eq!(err.kind(), FailureKind::Application(574));
    }

    #[test]
    fn test_kind_csrf_wins_over_unauthorized() {
        let err = status_error(401, body(574, "invalid csrf token"));
        assert_eq!(err.kind(), FailureKind::CsrfInvalid);
    }

    #[test]
    fn test_kind_unauthorized() {
        assert_eq!(status_error(401, None).kind(), FailureKind::Unauthorized);
        assert_eq!(
            status_error(401, body(1002, "token expired")).kind(),
            FailureKind::Unauthorized
        );
    }

    #[test]
    fn test_kind_application_and_unexpected() {
        assert_eq!(
            status_error(404, body(1001, "not found")).kind(),
            FailureKind::Application(1001)
        );
        assert_eq!(status_error(500, None).kind(), FailureKind::Unexpected);
        assert_eq!(
            ApiError::Unexpected(anyhow::anyhow!("bad url")).kind(),
            FailureKind::Unexpected
        );
    }

    #[test]
    fn test_accessors() {
        let err = status_error(404, body(1001, "not found"));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.code(), Some(1001));
        assert_eq!(err.url(), Some("http://localhost/order"));

        let err = ApiError::Unexpected(anyhow::anyhow!("bad url"));
        assert_eq!(err.status(), None);
        assert_eq!(err.code(), None);
        assert_eq!(err.url(), None);
    }

    #[test]
    fn test_display() {
        let err = status_error(404, body(1001, "not found"));
        let text = err.to_string();
        assert!(text.contains("POST http://localhost/order"));
        assert!(text.contains("HTTP 404"));
        assert!(text.contains("code 1001"));
        assert!(text.contains("not found"));

        let err = ApiError::Unexpected(anyhow::anyhow!("bad url"));
        assert_eq!(err.to_string(), "Request error: bad url");
    }
}
