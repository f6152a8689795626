use super::logger::{log_info, log_warn};

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Sink for user-facing toast style messages.
///
/// The embedding application decides how these are shown; the default
/// implementation just routes them into the log.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn warn(&self, message: &str) {
        self.notify(NoticeLevel::Warning, message);
    }
}

/// Notifier that writes to the tracing log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => log_info("🔔", message),
            NoticeLevel::Warning => log_warn("⚠️", message),
        }
    }
}
