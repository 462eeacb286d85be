//! Replay of a Trello action log into per-card history.
//!
//! Exports list actions newest first. They are replayed oldest first so each
//! card's history accumulates in the order it happened, then flipped back to
//! newest first for storage.

use chrono::{DateTime, Utc};
use kanban_core::LogEntry;
use kanban_domain::{parse_day, CardMeta, Comment, Revision, UserRegistry};
use serde_json::Map;
use std::collections::HashMap;

use crate::trello::{ActionType, TrelloAction};

const UNKNOWN_ACTOR: &str = "Unknown";

/// History reconstructed for one card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardHistory {
    pub comments: Vec<Comment>,
    pub activity: Vec<LogEntry>,
    pub revisions: Vec<Revision>,
}

impl CardHistory {
    /// Start a meta document from this history, bounded like any other.
    pub fn into_meta(self) -> CardMeta {
        let mut meta = CardMeta {
            comments: self.comments,
            activity: self.activity,
            revisions: self.revisions,
            ..Default::default()
        };
        meta.trim_logs();
        meta
    }

    fn log(&mut self, text: String, date: DateTime<Utc>) {
        self.activity.push(LogEntry::at(text, date));
    }
}

/// Replay `actions` (newest first, as exported) and return the history of
/// every card they touch. Action authors missing from `users` are added to it.
pub fn replay_actions(
    actions: &[TrelloAction],
    users: &mut UserRegistry,
) -> HashMap<String, CardHistory> {
    let mut replay = Replay {
        users,
        cards: HashMap::new(),
    };
    for action in actions.iter().rev() {
        replay.apply(action);
    }
    replay.finish()
}

struct Replay<'a> {
    users: &'a mut UserRegistry,
    cards: HashMap<String, CardHistory>,
}

impl Replay<'_> {
    fn apply(&mut self, action: &TrelloAction) {
        if let Some(creator) = &action.member_creator {
            if self.users.insert_if_absent(creator.to_user()) {
                tracing::debug!("Harvested user {} from action {}", creator.id, action.id);
            }
        }

        let Some(card_id) = action.data.card.as_ref().map(|c| c.id.clone()) else {
            return;
        };
        let actor = self.actor_name(action);
        let date = action.date;

        match action.kind {
            ActionType::CommentCard => {
                let initials = self.actor_initials(action);
                let comment = Comment {
                    id: action.id.clone(),
                    text: action.data.text.clone().unwrap_or_default(),
                    date,
                    user_id: action.creator_id().map(str::to_string),
                    user: Some(actor),
                    initials,
                    extra: Map::new(),
                };
                self.history(card_id).comments.push(comment);
            }
            ActionType::CreateCard => {
                self.history(card_id)
                    .log(format!("Created by {}", actor), date);
            }
            ActionType::UpdateCard => self.apply_update(card_id, action, &actor),
            ActionType::AddMemberToCard | ActionType::RemoveMemberFromCard => {
                let text = self.membership_text(action, &actor);
                self.history(card_id).log(text, date);
            }
            ActionType::Unknown => {}
        }
    }

    /// One `updateCard` can record several independent changes.
    fn apply_update(&mut self, card_id: String, action: &TrelloAction, actor: &str) {
        let data = &action.data;
        let date = action.date;
        let empty = Map::new();
        let old = data.old.as_ref().unwrap_or(&empty);
        let card = data.card.as_ref();
        let history = self.history(card_id);

        if let Some(list) = &data.list_after {
            let name = list.name.as_deref().unwrap_or("another list");
            history.log(format!("Moved to {} by {}", name, actor), date);
        }

        if let Some(previous) = old.get("desc") {
            history.revisions.push(Revision {
                id: action.id.clone(),
                date,
                text: previous.as_str().unwrap_or_default().to_string(),
                user: actor.to_string(),
            });
            history.log(format!("Description edited by {}", actor), date);
        }

        if let Some(was_closed) = old.get("closed") {
            let closed = card
                .and_then(|c| c.closed)
                .unwrap_or_else(|| !was_closed.as_bool().unwrap_or(false));
            let verb = if closed { "Archived" } else { "Restored" };
            history.log(format!("{} by {}", verb, actor), date);
        }

        if old.contains_key("due") {
            let text = match card.and_then(|c| c.due.as_deref()) {
                Some(due) => {
                    let day = parse_day(due).map(|d| d.to_string());
                    format!(
                        "Due date set to {} by {}",
                        day.as_deref().unwrap_or(due),
                        actor
                    )
                }
                None => format!("Due date removed by {}", actor),
            };
            history.log(text, date);
        }
    }

    fn membership_text(&self, action: &TrelloAction, actor: &str) -> String {
        let added = action.kind == ActionType::AddMemberToCard;
        let subject = action.data.id_member.as_deref();
        if subject.is_some() && subject == action.creator_id() {
            let verb = if added { "joined" } else { "left" };
            return format!("{} {} this card", actor, verb);
        }

        let member = action
            .data
            .member
            .as_ref()
            .and_then(|m| m.name.clone())
            .or_else(|| {
                subject
                    .and_then(|id| self.users.display_name(id))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "someone".to_string());
        if added {
            format!("{} added {} to this card", actor, member)
        } else {
            format!("{} removed {} from this card", actor, member)
        }
    }

    fn actor_name(&self, action: &TrelloAction) -> String {
        action
            .member_creator
            .as_ref()
            .and_then(|m| m.display_name())
            .or_else(|| {
                action
                    .creator_id()
                    .and_then(|id| self.users.display_name(id))
            })
            .unwrap_or(UNKNOWN_ACTOR)
            .to_string()
    }

    fn actor_initials(&self, action: &TrelloAction) -> Option<String> {
        let id = action.creator_id()?;
        self.users
            .get(id)
            .map(|u| u.initials.clone())
            .filter(|i| !i.is_empty())
    }

    fn history(&mut self, card_id: String) -> &mut CardHistory {
        self.cards.entry(card_id).or_default()
    }

    fn finish(self) -> HashMap<String, CardHistory> {
        let mut cards = self.cards;
        for history in cards.values_mut() {
            history.comments.reverse();
            history.activity.reverse();
            history.revisions.reverse();
        }
        cards
    }
}
