use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::card::{CardId, CardStub};

pub const DEFAULT_LIST_ID: &str = "l1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardList {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cards: Vec<CardStub>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BoardList {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cards: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Placeholder list shown for a board whose layout lists nothing.
    pub fn start() -> Self {
        Self::new(DEFAULT_LIST_ID, "Start")
    }

    /// Landing list created on a move target that has no lists.
    pub fn inbox() -> Self {
        Self::new(DEFAULT_LIST_ID, "Inbox")
    }

    pub fn position_of(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }

    pub fn take_card(&mut self, card_id: &str) -> Option<CardStub> {
        self.position_of(card_id).map(|pos| self.cards.remove(pos))
    }

    pub fn card_ids(&self) -> impl Iterator<Item = &CardId> {
        self.cards.iter().map(|c| &c.id)
    }
}
