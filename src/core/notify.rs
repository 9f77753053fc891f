//! Notification side-channel.
//!
//! Screens show toasts; the controller only needs somewhere to send the
//! message. The notifier is injected so a controller can run without any
//! surrounding application.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Fire-and-forget sink for user-visible outcomes
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

/// Default notifier: every notification becomes a log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notification = "success", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::warn!(notification = "error", "{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A notification captured by [`RecordingNotifier`]
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Keeps every notification in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices().iter().filter(|n| n.level == level).count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(NoticeLevel::Error)
    }

    pub fn successes(&self) -> Vec<String> {
        self.messages(NoticeLevel::Success)
    }

    fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice {
                level,
                message: message.to_string(),
                at: Utc::now(),
            });
        }
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.push(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }
}
