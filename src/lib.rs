pub mod audit;
pub mod config;
pub mod cookies;
pub mod http;
pub mod i18n;
pub mod notify;
pub mod runtime;
pub mod session;

pub use config::ClientConfig;
pub use http::{ApiError, ApiRequest, ApiResponse, SessionClient};
