//! User-visible notifications (toasts).

use log::{error, info, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToastKind::Success => write!(f, "success"),
            ToastKind::Error => write!(f, "error"),
            ToastKind::Info => write!(f, "info"),
            ToastKind::Warning => write!(f, "warning"),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, kind: ToastKind);
}

/// Prints notifications to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show(&self, message: &str, kind: ToastKind) {
        eprintln!("[{}] {}", kind, message);
    }
}

/// Routes notifications into the log when there is no UI to show them.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, message: &str, kind: ToastKind) {
        match kind {
            ToastKind::Error => error!("{}", message),
            ToastKind::Warning => warn!("{}", message),
            ToastKind::Success | ToastKind::Info => info!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_kind_display() {
        assert_eq!(ToastKind::Success.to_string(), "success");
        assert_eq!(ToastKind::Error.to_string(), "error");
        assert_eq!(ToastKind::Info.to_string(), "info");
        assert_eq!(ToastKind::Warning.to_string(), "warning");
    }

    #[test]
    fn test_log_notifier_accepts_every_kind() {
        let notifier = LogNotifier;
        for kind in [
            ToastKind::Success,
            ToastKind::Error,
            ToastKind::Info,
            ToastKind::Warning,
        ] {
            notifier.show("Saved", kind);
        }
    }
}
