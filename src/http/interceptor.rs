//! Request interceptor: CSRF header on state-changing requests.

use log::{debug, warn};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::cookies::CookieStore;

pub fn is_mutating(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

/// Copies the CSRF cookie into `header` for mutating methods.
///
/// Never fails: without a usable token the header is left unset and the
/// server's rejection is handled by response recovery.
pub fn attach_csrf(
    headers: &mut HeaderMap,
    method: &Method,
    cookies: &dyn CookieStore,
    cookie: &str,
    header: &HeaderName,
) {
    if !is_mutating(method) {
        return;
    }

    let Some(token) = cookies.get(cookie) else {
        debug!("No {} cookie, sending {} without CSRF header", cookie, method);
        return;
    };

    match HeaderValue::from_str(&token) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(header.clone(), value);
        }
        Err(_) => warn!("Ignoring {} cookie that is not a valid header value", cookie),
    }
}
