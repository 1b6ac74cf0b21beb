//! Localized messages for error notifications.
//!
//! Messages live in a nested JSON tree addressed by dotted keys:
//!
//! ```json
//! { "errors": { "1001": "Car wash not found", "other": { "noResponseFromServer": "..." } } }
//! ```

use anyhow::{Context, Result};
use log::debug;
use serde_json::{Map, Value, json};
use std::path::Path;

pub const UNEXPECTED_ERROR_KEY: &str = "errors.other.unexpectedErrorOccurred";
pub const NO_RESPONSE_KEY: &str = "errors.other.noResponseFromServer";
pub const SESSION_EXPIRED_KEY: &str = "errors.other.sessionExpired";
pub const SESSION_REFRESH_FAILED_KEY: &str = "errors.other.sessionRefreshFailed";

/// Translation key for an application error code.
pub fn error_code_key(code: i64) -> String {
    format!("errors.{}", code)
}

#[cfg_attr(test, mockall::automock)]
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// JSON message catalog. Unknown keys translate to themselves.
#[derive(Debug, Clone)]
pub struct Catalog {
    messages: Value,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            messages: json!({
                "errors": {
                    "other": {
                        "unexpectedErrorOccurred": "An unexpected error occurred.",
                        "noResponseFromServer": "No response from server.",
                        "sessionExpired": "Your session has expired. Please sign in again.",
                        "sessionRefreshFailed": "Could not refresh your session. Please try again."
                    }
                }
            }),
        }
    }
}

impl Catalog {
    /// Built-in messages overlaid with `messages`.
    pub fn from_value(messages: Value) -> Self {
        let mut catalog = Self::default();
        catalog.merge(messages);
        catalog
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let messages: Value =
            serde_json::from_str(json).context("Failed to parse message catalog")?;
        Ok(Self::from_value(messages))
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading message catalog from {:?}", path);
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message catalog {:?}", path))?;
        Self::from_json(&contents)
    }

    pub fn merge(&mut self, overlay: Value) {
        merge_values(&mut self.messages, overlay);
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        key.split('.')
            .try_fold(&self.messages, |node, part| node.get(part))?
            .as_str()
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => merge_objects(base, overlay),
        (base, overlay) => *base = overlay,
    }
}

fn merge_objects(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_error_code_key() {
        assert_eq!(error_code_key(1001), "errors.1001");
        assert_eq!(error_code_key(574), "errors.574");
    }

    #[test]
    fn test_default_fallbacks_are_present() {
        let catalog = Catalog::default();
        for key in [
            UNEXPECTED_ERROR_KEY,
            NO_RESPONSE_KEY,
            SESSION_EXPIRED_KEY,
            SESSION_REFRESH_FAILED_KEY,
        ] {
            assert!(catalog.lookup(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_unknown_key_translates_to_itself() {
        let catalog = Catalog::default();
        assert_eq!(catalog.translate("errors.4242"), "errors.4242");
        assert_eq!(catalog.translate("errors.other"), "errors.other");
    }

    #[test]
    fn test_overlay_keeps_builtin_messages() {
        let catalog = Catalog::from_json(
            r#"{"errors": {"1001": "Car wash not found", "other": {"noResponseFromServer": "Server is silent"}}}"#,
        )
        .unwrap();

        assert_eq!(catalog.translate("errors.1001"), "Car wash not found");
        assert_eq!(catalog.translate(NO_RESPONSE_KEY), "Server is silent");
        assert_eq!(
            catalog.translate(UNEXPECTED_ERROR_KEY),
            "An unexpected error occurred."
        );
    }

    #[test]
    fn test_from_json_rejects_invalid_json() {
        assert!(Catalog::from_json("{not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"errors": {{"2003": "Equipment is offline"}}}}"#).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.translate("errors.2003"), "Equipment is offline");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/messages.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read message catalog"));
    }
}
