//! HTTP client module with CSRF handling and session recovery.

mod client;
mod error;
mod interceptor;
mod recovery;
mod request;

pub use client::{SessionClient, SessionClientBuilder};
pub use error::{ApiError, CSRF_INVALID_CODE, CSRF_INVALID_MESSAGE, ErrorBody, FailureKind};
pub use interceptor::{attach_csrf, is_mutating};
pub use recovery::{PendingRequest, Recovery, RetryState};
pub use request::{ApiRequest, ApiResponse};
