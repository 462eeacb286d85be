use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound for append-only card logs (activity, revisions).
pub const MAX_LOG_ENTRIES: usize = 50;

/// One line of a card's activity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    pub date: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(text, Utc::now())
    }

    pub fn at(text: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            date,
        }
    }
}

/// Anything that keeps a newest-first, bounded activity log.
pub trait Loggable {
    fn add_log(&mut self, entry: LogEntry);
    fn get_logs(&self) -> &[LogEntry];
}
