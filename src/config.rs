//! Client configuration: backend location, session endpoints and CSRF naming.

use anyhow::{Context, Result, bail};
use reqwest::Url;
use reqwest::header::HeaderName;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CSRF_PATH: &str = "/user/auth/csrf-token";
pub const DEFAULT_REFRESH_PATH: &str = "/user/auth/refresh";
pub const DEFAULT_LOGOUT_PATH: &str = "/user/auth/logout";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_CSRF_COOKIE: &str = "csrf-token";
pub const DEFAULT_CSRF_HEADER: &str = "_csrf";

/// Settings for a [`SessionClient`](crate::http::SessionClient).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend root, e.g. `https://api.example.com/v1`
    pub base_url: String,
    pub csrf_path: String,
    pub refresh_path: String,
    pub logout_path: String,
    /// Route the navigator is sent to after a forced logout
    pub login_route: String,
    pub csrf_cookie: String,
    pub csrf_header: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    /// Optional JSON message catalog merged over the built-in messages
    pub messages: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            csrf_path: DEFAULT_CSRF_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            user_agent: format!("washdesk/{}", env!("WASHDESK_VERSION")),
            timeout: None,
            messages: None,
        }
    }

    pub fn with_csrf_path(mut self, path: impl Into<String>) -> Self {
        self.csrf_path = path.into();
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_messages(mut self, path: impl Into<PathBuf>) -> Self {
        self.messages = Some(path.into());
        self
    }

    /// Checks the configuration and returns the parsed base URL.
    pub fn validate(&self) -> Result<Url> {
        let base = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.base_url))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            bail!("API base URL must use http or https, got '{}'", base.scheme());
        }

        for (name, path) in [
            ("csrf_path", &self.csrf_path),
            ("refresh_path", &self.refresh_path),
            ("logout_path", &self.logout_path),
            ("login_route", &self.login_route),
        ] {
            if !path.starts_with('/') {
                bail!("{} must start with '/', got '{}'", name, path);
            }
        }

        if self.csrf_cookie.is_empty() {
            bail!("csrf_cookie must not be empty");
        }

        self.header_name()?;
        Ok(base)
    }

    /// The CSRF request header as a typed header name.
    pub fn header_name(&self) -> Result<HeaderName> {
        HeaderName::from_bytes(self.csrf_header.as_bytes())
            .with_context(|| format!("Invalid CSRF header name: {}", self.csrf_header))
    }

    /// Resolves a request path against the base URL.
    /// Absolute `http(s)://` URLs are used as given.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).with_context(|| format!("Invalid request URL: {}", path));
        }

        let base = self.base_url.trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };
        Url::parse(&joined).with_context(|| format!("Invalid request URL: {}", joined))
    }

    /// Classifies a request path as one of the session endpoints.
    pub fn endpoint_of(&self, path: &str) -> Endpoint {
        let path = self.relative_path(path);
        if path == self.csrf_path {
            Endpoint::CsrfToken
        } else if path == self.refresh_path {
            Endpoint::AuthRefresh
        } else {
            Endpoint::Other
        }
    }

    fn relative_path(&self, path: &str) -> String {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        if !(path.starts_with("http://") || path.starts_with("https://")) {
            return format!("/{}", path.trim_start_matches('/'));
        }

        let base = self.base_url.trim_end_matches('/');
        match path.strip_prefix(base) {
            Some(rest) => format!("/{}", rest.trim_start_matches('/')),
            None => Url::parse(path)
                .map(|u| u.path().to_string())
                .unwrap_or_else(|_| path.to_string()),
        }
    }
}

/// Which session endpoint, if any, a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CsrfToken,
    AuthRefresh,
    Other,
}
