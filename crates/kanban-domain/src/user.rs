use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub initials: String,
    /// Board-relative path of a locally stored avatar.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Remote avatar reference kept for later re-fetching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_hash: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let initials = Self::initials_of(&full_name);
        Self {
            id: id.into(),
            full_name,
            username: String::new(),
            initials,
            avatar: None,
            avatar_hash: None,
        }
    }

    pub fn initials_of(full_name: &str) -> String {
        full_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(3)
            .collect()
    }

    pub fn display_name(&self) -> &str {
        if !self.full_name.is_empty() {
            &self.full_name
        } else if !self.username.is_empty() {
            &self.username
        } else {
            &self.id
        }
    }
}

/// Users known to one board, keyed by user id.
///
/// References into the registry are soft: looking up an unknown id yields
/// `None` and never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRegistry {
    users: BTreeMap<String, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.users.contains_key(id)
    }

    pub fn insert(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Insert `user` unless its id is already registered; returns whether it was added.
    pub fn insert_if_absent(&mut self, user: User) -> bool {
        if self.contains(&user.id) {
            return false;
        }
        self.insert(user);
        true
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.get(id).map(User::display_name)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }
}
