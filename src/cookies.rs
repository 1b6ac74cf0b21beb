//! Cookie storage shared between the HTTP client and the CSRF interceptor.

use cookie::Cookie;
use cookie::time::Duration;
use log::debug;
use reqwest::Url;
use reqwest::cookie::{CookieStore as _, Jar};
use std::sync::Arc;

/// Read/clear access to cookies by name.
///
/// Cookie values are credentials: implementations must not log them.
#[cfg_attr(test, mockall::automock)]
pub trait CookieStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn clear(&self, name: &str);
}

/// [`CookieStore`] over the reqwest cookie jar installed on the client,
/// scoped to the API base URL.
pub struct JarCookies {
    jar: Arc<Jar>,
    url: Url,
}

impl JarCookies {
    pub fn new(jar: Arc<Jar>, url: Url) -> Self {
        Self { jar, url }
    }

    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Stores a cookie for the whole API origin.
    pub fn set(&self, name: &str, value: &str) {
        let cookie = Cookie::build((name, value)).path("/").build();
        self.jar.add_cookie_str(&cookie.to_string(), &self.url);
    }
}

impl CookieStore for JarCookies {
    fn get(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, name)
    }

    fn clear(&self, name: &str) {
        debug!("Clearing cookie {}", name);
        let removal = Cookie::build((name, ""))
            .path("/")
            .max_age(Duration::ZERO)
            .build();
        self.jar.add_cookie_str(&removal.to_string(), &self.url);
    }
}

/// Finds `name` in a `Cookie` header value (`a=1; b=2`).
fn find_cookie(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar_cookies() -> JarCookies {
        let url = Url::parse("http://127.0.0.1:8080/api").unwrap();
        JarCookies::new(Arc::new(Jar::default()), url)
    }

    #[test]
    fn test_find_cookie() {
        let header = "session=abc; csrf-token=xyz; theme=\"dark\"";
        assert_eq!(find_cookie(header, "csrf-token"), Some("xyz".to_string()));
        assert_eq!(find_cookie(header, "theme"), Some("dark".to_string()));
        assert_eq!(find_cookie(header, "missing"), None);
        assert_eq!(find_cookie("csrf-token=", "csrf-token"), None);
    }

    #[test]
    fn test_find_cookie_does_not_match_prefix() {
        assert_eq!(find_cookie("csrf-token-old=1", "csrf-token"), None);
    }

    #[test]
    fn test_get_missing_cookie() {
        let cookies = jar_cookies();
        assert_eq!(cookies.get("csrf-token"), None);
    }

    #[test]
    fn test_set_then_get() {
        let cookies = jar_cookies();
        cookies.set("csrf-token", "abc");
        assert_eq!(cookies.get("csrf-token"), Some("abc".to_string()));
    }

    #[test]
    fn test_set_overwrites() {
        let cookies = jar_cookies();
        cookies.set("csrf-token", "abc");
        cookies.set("csrf-token", "xyz");
        assert_eq!(cookies.get("csrf-token"), Some("xyz".to_string()));
    }

    #[test]
    fn test_find_cookie_skips_malformed_pairs() {
        assert_eq!(
            find_cookie("garbage; csrf-token=xyz", "csrf-token"),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn test_clear_then_set_again() {
        let cookies = jar_cookies();
        cookies.set("csrf-token", "abc");
        cookies.clear("csrf-token");
        cookies.set("csrf-token", "fresh");
        assert_eq!(cookies.get("csrf-token"), Some("fresh".to_string()));
    }

    #[test]
    fn test_clear_removes_only_named_cookie() {
        let cookies = jar_cookies();
        cookies.set("csrf-token", "abc");
        cookies.set("session", "s1");

        cookies.clear("csrf-token");

        assert_eq!(cookies.get("csrf-token"), None);
        assert_eq!(cookies.get("session"), Some("s1".to_string()));
    }
}
