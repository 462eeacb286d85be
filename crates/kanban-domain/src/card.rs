use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::label::Label;

pub type CardId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSummary {
    pub total: usize,
    pub done: usize,
}

/// A card as it appears inside the layout document.
///
/// `description` and `comment_count` are hydrated from the card's own files
/// when a board is loaded and never written back to the layout. Dates are
/// kept exactly as stored; [`CardStub::due_day`] reads the day out of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStub {
    pub id: CardId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub due_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<ChecklistSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardStub {
    pub fn new(id: impl Into<CardId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            labels: Vec::new(),
            due_date: None,
            start_date: None,
            assignees: Vec::new(),
            cover: None,
            created_at: None,
            checklist: None,
            description: None,
            comment_count: None,
            extra: Map::new(),
        }
    }

    /// Drop the fields owned by other files before the layout is written.
    pub fn dehydrate(&mut self) {
        self.description = None;
        self.comment_count = None;
    }

    pub fn hydrate(&mut self, description: String, comment_count: usize) {
        self.description = Some(description);
        self.comment_count = Some(comment_count);
    }

    pub fn set_due_day(&mut self, day: Option<NaiveDate>) {
        self.due_date = day.map(|d| Value::String(d.to_string()));
    }

    pub fn set_start_day(&mut self, day: Option<NaiveDate>) {
        self.start_date = day.map(|d| Value::String(d.to_string()));
    }

    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.as_ref().and_then(Value::as_str).and_then(parse_day)
    }
}

/// Parse the day part of a date or timestamp string (`2024-03-01` or
/// `2024-03-01T12:00:00.000Z`).
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let day = value.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
