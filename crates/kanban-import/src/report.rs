use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchKind {
    Avatar,
    Attachment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchStatus {
    /// Downloaded and written to `path` (board-relative).
    Fetched { path: String },
    /// Already present locally.
    Skipped { path: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
    pub kind: FetchKind,
    /// User id for avatars, card id for attachments.
    pub subject: String,
    pub url: String,
    #[serde(flatten)]
    pub status: FetchStatus,
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, FetchStatus::Failed { .. })
    }

    /// Board-relative path of the local file, when one exists.
    pub fn local_path(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Fetched { path } | FetchStatus::Skipped { path } => Some(path),
            FetchStatus::Failed { .. } => None,
        }
    }
}

/// Summary of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub board_id: String,
    pub title: String,
    pub lists: usize,
    pub cards: usize,
    pub archived_cards: usize,
    /// Export cards left out because their id cannot name a card file.
    pub skipped_cards: usize,
    pub users: usize,
    pub fetches: Vec<FetchOutcome>,
}

impl ImportReport {
    pub fn new(board_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn failed_fetches(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.fetches.iter().filter(|f| f.is_failed())
    }

    /// True when every remote fetch succeeded or was already satisfied.
    pub fn is_complete(&self) -> bool {
        self.failed_fetches().next().is_none()
    }
}
