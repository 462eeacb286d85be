use chrono::{DateTime, Utc};
use kanban_core::logging::MAX_LOG_ENTRIES;
use kanban_core::{LogEntry, Loggable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::card::ChecklistSummary;

const UNKNOWN_USER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Display name captured at write time, used when `user_id` does not resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Snapshot of a card description as it was before an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub id: String,
    pub date: DateTime<Utc>,
    pub text: String,
    #[serde(default = "unknown_user")]
    pub user: String,
}

fn unknown_user() -> String {
    UNKNOWN_USER.to_string()
}

impl Revision {
    pub fn new(text: impl Into<String>, user: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            date: Utc::now(),
            text: text.into(),
            user: user.filter(|u| !u.is_empty()).unwrap_or_else(unknown_user),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Complete,
    #[serde(other)]
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub name: String,
    pub state: CheckState,
}

impl ChecklistItem {
    pub fn is_complete(&self) -> bool {
        self.state == CheckState::Complete
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    /// Render as a Markdown section appended to a card body.
    pub fn to_markdown(&self) -> String {
        let mut md = format!("\n\n### {}\n", self.name);
        for item in &self.items {
            let mark = if item.is_complete() { 'x' } else { ' ' };
            md.push_str(&format!("- [{}] {}\n", mark, item.name));
        }
        md
    }
}

/// Derived history kept next to a card: everything that is not the card body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardMeta {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub activity: Vec<LogEntry>,
    #[serde(default)]
    pub revisions: Vec<Revision>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub checklists: Vec<Checklist>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardMeta {
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Newest revision first; the oldest fall off past the bound.
    pub fn push_revision(&mut self, revision: Revision) {
        self.revisions.insert(0, revision);
        self.revisions.truncate(MAX_LOG_ENTRIES);
    }

    /// Re-apply the log bounds after bulk construction.
    pub fn trim_logs(&mut self) {
        self.activity.truncate(MAX_LOG_ENTRIES);
        self.revisions.truncate(MAX_LOG_ENTRIES);
    }

    pub fn checklist_summary(&self) -> Option<ChecklistSummary> {
        if self.checklists.is_empty() {
            return None;
        }
        let items = self.checklists.iter().flat_map(|c| c.items.iter());
        let (total, done) = items.fold((0, 0), |(total, done), item| {
            (total + 1, done + usize::from(item.is_complete()))
        });
        Some(ChecklistSummary { total, done })
    }
}

impl Loggable for CardMeta {
    fn add_log(&mut self, entry: LogEntry) {
        self.activity.insert(0, entry);
        self.activity.truncate(MAX_LOG_ENTRIES);
    }

    fn get_logs(&self) -> &[LogEntry] {
        &self.activity
    }
}
