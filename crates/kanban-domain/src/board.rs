use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::card::CardStub;
use crate::list::BoardList;

pub type BoardId = String;

/// The layout document: list order and card order of one board, without bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_lists")]
    pub lists: Vec<BoardList>,
    #[serde(default)]
    pub archive: Vec<CardStub>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_lists() -> Vec<BoardList> {
    vec![BoardList::start()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: BoardId,
    pub name: String,
}

impl BoardLayout {
    /// Layout written for a freshly created board.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lists: Vec::new(),
            archive: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Layout synthesised for a board directory without a layout document.
    pub fn fallback(board_id: &str) -> Self {
        let mut layout = Self::new(String::new());
        layout.lists = default_lists();
        layout.ensure_title(board_id);
        layout
    }

    pub fn ensure_title(&mut self, board_id: &str) {
        if self.title.is_empty() {
            let mut chars = board_id.chars();
            self.title = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardStub> {
        self.lists
            .iter()
            .flat_map(|l| l.cards.iter())
            .chain(self.archive.iter())
    }

    pub fn cards_mut(&mut self) -> impl Iterator<Item = &mut CardStub> {
        self.lists
            .iter_mut()
            .flat_map(|l| l.cards.iter_mut())
            .chain(self.archive.iter_mut())
    }

    pub fn find_card(&self, card_id: &str) -> Option<&CardStub> {
        self.cards().find(|c| c.id == card_id)
    }

    pub fn is_archived(&self, card_id: &str) -> bool {
        self.archive.iter().any(|c| c.id == card_id)
    }

    /// Remove a card stub from whichever list holds it. Archived cards are not searched.
    pub fn take_from_lists(&mut self, card_id: &str) -> Option<CardStub> {
        self.lists.iter_mut().find_map(|l| l.take_card(card_id))
    }

    /// Put a card at the head of the first list, creating an inbox when there is none.
    pub fn push_front_of_first_list(&mut self, card: CardStub) {
        if self.lists.is_empty() {
            self.lists.push(BoardList::inbox());
        }
        self.lists[0].cards.insert(0, card);
    }

    pub fn dehydrate(&mut self) {
        self.cards_mut().for_each(CardStub::dehydrate);
    }
}
