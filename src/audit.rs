//! Structured request/response log.
//!
//! Sinks are fire-and-forget: they never fail and never block the request pipeline.

use serde_json::{Map, Value};

pub type LogFields = Map<String, Value>;

#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    fn info(&self, event: &str, fields: &LogFields);
    fn error(&self, event: &str, fields: &LogFields);
}

/// Emits log events as `tracing` events under the `washdesk::audit` target.
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn info(&self, event: &str, fields: &LogFields) {
        let fields = Value::Object(fields.clone());
        tracing::info!(target: "washdesk::audit", event = event, fields = %fields);
    }

    fn error(&self, event: &str, fields: &LogFields) {
        let fields = Value::Object(fields.clone());
        tracing::error!(target: "washdesk::audit", event = event, fields = %fields);
    }
}

/// Current time as RFC 3339, the `timestamp` field of every event.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Starts a field set with the `timestamp` already filled in.
pub fn fields() -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("timestamp".to_string(), Value::String(timestamp()));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_rfc3339() {
        let ts = timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok(), "{}", ts);
    }

    #[test]
    fn test_fields_start_with_timestamp() {
        let fields = fields();
        assert_eq!(fields.len(), 1);
        assert!(fields["timestamp"].is_string());
    }

    #[test]
    fn test_tracing_sink_formats_fields_under_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let mut fields = fields();
            fields.insert("url".to_string(), Value::from("http://localhost/order"));
            fields.insert("code".to_string(), Value::from(574));

            TracingLogSink.info("http.request", &fields);
            TracingLogSink.error("http.error", &fields);
        });
    }

    #[test_log::test]
    fn test_tracing_sink_emits_without_panicking() {
        let mut fields = fields();
        fields.insert("method".to_string(), Value::from("GET"));
        fields.insert("status".to_string(), Value::from(200));

        TracingLogSink.info("http.response", &fields);
        TracingLogSink.error("http.error", &fields);
    }
}
