//! The subset of the Trello board export consumed by the importer.
//!
//! Every collection and most scalar fields are optional in practice; absent
//! values deserialize to empty defaults.

use chrono::{DateTime, Utc};
use kanban_core::{KanbanError, KanbanResult};
use kanban_domain::User;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloExport {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lists: Vec<TrelloList>,
    #[serde(default)]
    pub cards: Vec<TrelloCard>,
    #[serde(default)]
    pub checklists: Vec<TrelloChecklist>,
    #[serde(default)]
    pub actions: Vec<TrelloAction>,
    #[serde(default)]
    pub members: Vec<TrelloMember>,
    /// Board-wide colour → label name vocabulary.
    #[serde(default)]
    pub label_names: HashMap<String, String>,
}

impl TrelloExport {
    pub fn from_json(json: &str) -> KanbanResult<Self> {
        serde_json::from_str(json).map_err(|err| {
            KanbanError::InvalidInput(format!("Invalid Trello export: {}", err))
        })
    }

    pub async fn from_file(path: &Path) -> KanbanResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|err| {
            KanbanError::InvalidInput(format!(
                "Cannot read Trello export {}: {}",
                path.display(),
                err
            ))
        })?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloList {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloCard {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub id_list: String,
    #[serde(default)]
    pub pos: f64,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub labels: Vec<TrelloLabel>,
    #[serde(default)]
    pub id_members: Vec<String>,
    #[serde(default)]
    pub id_attachment_cover: Option<String>,
    #[serde(default)]
    pub attachments: Vec<TrelloAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrelloLabel {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloAttachment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloChecklist {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub id_card: String,
    #[serde(default)]
    pub check_items: Vec<TrelloCheckItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrelloCheckItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloMember {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default)]
    pub avatar_hash: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl TrelloMember {
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.username.as_deref().filter(|n| !n.is_empty()))
    }

    /// Registry entry for this member; the avatar is filled in once fetched.
    pub fn to_user(&self) -> User {
        let mut user = User::new(&self.id, self.full_name.clone().unwrap_or_default());
        user.username = self.username.clone().unwrap_or_default();
        if let Some(initials) = self.initials.as_deref().filter(|i| !i.is_empty()) {
            user.initials = initials.to_string();
        }
        user.avatar_hash = self.avatar_hash.clone();
        user
    }
}

/// Action types the replay understands; everything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    CommentCard,
    CreateCard,
    UpdateCard,
    AddMemberToCard,
    RemoveMemberFromCard,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloAction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub id_member_creator: Option<String>,
    #[serde(default)]
    pub member_creator: Option<TrelloMember>,
    #[serde(default)]
    pub data: ActionData,
}

impl TrelloAction {
    /// Id of the acting member, from `idMemberCreator` or the embedded creator.
    pub fn creator_id(&self) -> Option<&str> {
        self.id_member_creator
            .as_deref()
            .or_else(|| self.member_creator.as_ref().map(|m| m.id.as_str()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    #[serde(default)]
    pub card: Option<ActionCard>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub list_before: Option<NamedRef>,
    #[serde(default)]
    pub list_after: Option<NamedRef>,
    /// Previous values of the fields an `updateCard` changed. Keys matter even
    /// when their value is null.
    #[serde(default)]
    pub old: Option<Map<String, Value>>,
    #[serde(default)]
    pub id_member: Option<String>,
    #[serde(default)]
    pub member: Option<NamedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionCard {
    pub id: String,
    #[serde(default)]
    pub closed: Option<bool>,
    #[serde(default)]
    pub due: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
