//! Session recovery state for a single call.
//!
//! Each call carries two one-shot flags. A recoverable failure sets its flag and
//! allows one replay; the same failure a second time is terminal.

use crate::config::Endpoint;
use crate::i18n::{NO_RESPONSE_KEY, UNEXPECTED_ERROR_KEY, error_code_key};

use super::error::FailureKind;
use super::request::ApiRequest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub csrf_retried: bool,
    pub auth_retried: bool,
}

/// What to do about a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Fetch a fresh CSRF token, then replay
    RefreshCsrf,
    /// Renew the auth session, then replay
    RefreshAuth,
    /// CSRF cannot be recovered: tell the user and give up
    SessionExpired,
    /// Auth cannot be recovered: tear the session down
    ForceLogout,
    /// Not a session problem: show the message for this key once
    Surface(String),
}

/// The original request plus its retry flags, owned by one call.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    request: ApiRequest,
    retry: RetryState,
}

impl PendingRequest {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            retry: RetryState::default(),
        }
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    pub fn retry(&self) -> RetryState {
        self.retry
    }

    /// Decides how to handle `kind`, marking the matching flag when a replay is granted.
    pub fn recover(&mut self, kind: FailureKind, endpoint: Endpoint) -> Recovery {
        match kind {
            FailureKind::CsrfInvalid => {
                if self.retry.csrf_retried || endpoint == Endpoint::CsrfToken {
                    Recovery::SessionExpired
                } else {
                    self.retry.csrf_retried = true;
                    Recovery::RefreshCsrf
                }
            }
            FailureKind::Unauthorized => {
                if self.retry.auth_retried || endpoint == Endpoint::AuthRefresh {
                    Recovery::ForceLogout
                } else {
                    self.retry.auth_retried = true;
                    Recovery::RefreshAuth
                }
            }
            FailureKind::Application(code) => Recovery::Surface(error_code_key(code)),
            FailureKind::Network => Recovery::Surface(NO_RESPONSE_KEY.to_string()),
            FailureKind::Unexpected => Recovery::Surface(UNEXPECTED_ERROR_KEY.to_string()),
        }
    }
}
