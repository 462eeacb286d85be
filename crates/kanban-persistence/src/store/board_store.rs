use crate::serialization::JsonSerializer;
use crate::store::atomic_writer::AtomicWriter;
use crate::store::board_lock::BoardLocks;
use chrono::Utc;
use kanban_core::{slugify, unique_slug, AppConfig, KanbanError, KanbanResult};
use kanban_domain::{
    upload_filename, BoardId, BoardLayout, BoardSummary, CardMeta, Revision, UserRegistry,
};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

pub const LAYOUT_FILE: &str = "layout.json";
pub const USERS_FILE: &str = "users.json";
pub const UPLOADS_DIR: &str = "uploads";
pub const AVATARS_DIR: &str = "avatars";

const DEFAULT_BOARD_TITLE: &str = "New Board";

/// File-backed storage for every board under one root directory.
///
/// Each board is a directory holding `layout.json`, `users.json`, one
/// `<card>.md` body and one `<card>.json` meta file per card, and `uploads/`.
/// The files are written independently: a reader may observe a layout that
/// references a card whose files are missing, and treats those as empty.
#[derive(Debug)]
pub struct BoardStore {
    root: PathBuf,
    asset_url_prefix: String,
    locks: BoardLocks,
}

impl BoardStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            asset_url_prefix: kanban_core::config::DEFAULT_ASSET_URL_PREFIX.to_string(),
            locks: BoardLocks::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.effective_boards_dir())
            .with_asset_url_prefix(config.effective_asset_url_prefix())
    }

    pub fn with_asset_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.asset_url_prefix = prefix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn locks(&self) -> &BoardLocks {
        &self.locks
    }

    // ---- identifiers and paths ----

    pub fn validate_board_id(id: &str) -> KanbanResult<()> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(KanbanError::InvalidInput(format!(
                "Invalid board id: {:?}",
                id
            )));
        }
        Ok(())
    }

    pub fn validate_card_id(id: &str) -> KanbanResult<()> {
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(KanbanError::InvalidInput(format!(
                "Invalid card id: {:?}",
                id
            )));
        }
        Ok(())
    }

    pub fn board_path(&self, id: &str) -> KanbanResult<PathBuf> {
        Self::validate_board_id(id)?;
        Ok(self.root.join(id))
    }

    pub(crate) fn existing_board_path(&self, id: &str) -> KanbanResult<PathBuf> {
        let path = self.board_path(id)?;
        if !path.is_dir() {
            return Err(KanbanError::NotFound(format!("Board {}", id)));
        }
        Ok(path)
    }

    pub fn board_exists(&self, id: &str) -> bool {
        Self::validate_board_id(id).is_ok() && self.root.join(id).exists()
    }

    /// First free board id for `candidate`, suffixing `-1`, `-2`, ... as needed.
    pub fn unique_board_id(&self, candidate: &str) -> BoardId {
        unique_slug(candidate, |slug| self.root.join(slug).exists())
    }

    /// Link prefix embedded in card bodies for this board's assets.
    pub fn asset_link_prefix(&self, board_id: &str) -> String {
        format!("{}/{}/", self.asset_url_prefix, board_id)
    }

    pub fn asset_url(&self, board_id: &str, file: &str) -> String {
        format!(
            "{}{}/{}",
            self.asset_link_prefix(board_id),
            UPLOADS_DIR,
            file
        )
    }

    pub(crate) fn card_body_path(board_dir: &Path, card_id: &str) -> PathBuf {
        board_dir.join(format!("{}.md", card_id))
    }

    pub(crate) fn card_meta_path(board_dir: &Path, card_id: &str) -> PathBuf {
        board_dir.join(format!("{}.json", card_id))
    }

    fn asset_path(board_dir: &Path, relative: &str) -> KanbanResult<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.as_os_str().is_empty() {
            return Err(KanbanError::InvalidInput(format!(
                "Invalid asset path: {}",
                relative.display()
            )));
        }
        Ok(board_dir.join(UPLOADS_DIR).join(relative))
    }

    // ---- board lifecycle ----

    /// Create the directory tree of a board with an exact id.
    ///
    /// Fails with `Conflict` if the id is already taken.
    pub async fn provision_board(&self, id: &str) -> KanbanResult<PathBuf> {
        let path = self.board_path(id)?;
        fs::create_dir_all(&self.root).await?;
        match fs::create_dir(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(KanbanError::Conflict(format!("Board {} already exists", id)));
            }
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(path.join(UPLOADS_DIR).join(AVATARS_DIR)).await?;
        tracing::debug!("Provisioned board directory {}", path.display());
        Ok(path)
    }

    pub async fn create_board(&self, title: &str, slug_hint: Option<&str>) -> KanbanResult<BoardId> {
        let title = match title.trim() {
            "" => DEFAULT_BOARD_TITLE,
            trimmed => trimmed,
        };
        let candidate = slug_hint
            .map(slugify)
            .filter(|s| !s.is_empty())
            .or_else(|| Some(slugify(title)).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| format!("board-{}", Utc::now().format("%y%m%d")));
        let id = self.unique_board_id(&candidate);

        let dir = self.provision_board(&id).await?;
        self.write_layout(&dir, &BoardLayout::new(title)).await?;
        Self::write_json(&dir.join(USERS_FILE), &UserRegistry::new()).await?;

        tracing::info!("Created board {} ({})", id, title);
        Ok(id)
    }

    pub async fn list_boards(&self) -> KanbanResult<Vec<BoardSummary>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut boards = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if Self::validate_board_id(&id).is_err() {
                continue;
            }
            let name = match listed_title(&entry.path()).await {
                Ok(Some(title)) => title,
                Ok(None) => id.clone(),
                Err(e) => {
                    tracing::warn!("Unreadable layout for board {}: {}", id, e);
                    id.clone()
                }
            };
            boards.push(BoardSummary { id, name });
        }
        boards.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(boards)
    }

    /// Remove a board directory and everything below it, deepest entries first.
    pub async fn delete_board(&self, id: &str) -> KanbanResult<()> {
        let path = self.board_path(id)?;
        let _guard = self.locks.lock(id).await;

        let metadata = match fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(KanbanError::NotFound(format!("Board {}", id)));
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.file_type().is_symlink() {
            return Err(KanbanError::InvalidInput(format!(
                "Refusing to delete symlinked board {}",
                id
            )));
        }
        if !metadata.is_dir() {
            return Err(KanbanError::NotFound(format!("Board {}", id)));
        }

        let removed = tokio::task::spawn_blocking(move || remove_tree(&path))
            .await
            .map_err(|e| KanbanError::Internal(e.to_string()))??;
        self.locks.forget(id);
        tracing::info!("Deleted board {} ({} entries)", id, removed);
        Ok(())
    }

    // ---- layout ----

    pub(crate) async fn read_layout_at(&self, dir: &Path, id: &str) -> KanbanResult<BoardLayout> {
        let mut layout = match AtomicWriter::read_optional(&dir.join(LAYOUT_FILE)).await? {
            Some(bytes) => JsonSerializer::deserialize::<BoardLayout>(&bytes)?,
            None => BoardLayout::fallback(id),
        };
        layout.ensure_title(id);
        Ok(layout)
    }

    /// The layout document as stored, without card bodies.
    pub async fn read_layout(&self, id: &str) -> KanbanResult<BoardLayout> {
        let dir = self.existing_board_path(id)?;
        self.read_layout_at(&dir, id).await
    }

    /// Load a board with every card hydrated from its body and meta files.
    pub async fn load_board(&self, id: &str) -> KanbanResult<BoardLayout> {
        let dir = self.existing_board_path(id)?;
        let mut layout = self.read_layout_at(&dir, id).await?;

        for card in layout.cards_mut() {
            if Self::validate_card_id(&card.id).is_err() {
                tracing::warn!("Board {} lists card with invalid id {:?}", id, card.id);
                card.hydrate(String::new(), 0);
                continue;
            }
            let body = Self::read_body_at(&dir, &card.id).await?;
            let meta = Self::read_meta_at(&dir, &card.id).await?;
            card.hydrate(body, meta.comment_count());
        }
        Ok(layout)
    }

    pub(crate) async fn write_layout(&self, dir: &Path, layout: &BoardLayout) -> KanbanResult<()> {
        let mut stored = layout.clone();
        stored.dehydrate();
        Self::write_json(&dir.join(LAYOUT_FILE), &stored).await
    }

    /// Persist the layout; card descriptions are owned by the body files and stripped here.
    pub async fn save_layout(&self, id: &str, layout: &BoardLayout) -> KanbanResult<()> {
        let dir = self.existing_board_path(id)?;
        let _guard = self.locks.lock(id).await;
        self.write_layout(&dir, layout).await
    }

    // ---- cards ----

    pub(crate) async fn read_body_at(dir: &Path, card_id: &str) -> KanbanResult<String> {
        let bytes = AtomicWriter::read_optional(&Self::card_body_path(dir, card_id)).await?;
        Ok(bytes
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default())
    }

    pub(crate) async fn read_meta_at(dir: &Path, card_id: &str) -> KanbanResult<CardMeta> {
        Self::read_json_tolerant(&Self::card_meta_path(dir, card_id)).await
    }

    pub(crate) async fn write_meta_at(dir: &Path, card_id: &str, meta: &CardMeta) -> KanbanResult<()> {
        Self::write_json(&Self::card_meta_path(dir, card_id), meta).await
    }

    pub async fn read_card_body(&self, board_id: &str, card_id: &str) -> KanbanResult<String> {
        Self::validate_card_id(card_id)?;
        let dir = self.existing_board_path(board_id)?;
        Self::read_body_at(&dir, card_id).await
    }

    pub async fn save_card_body(&self, board_id: &str, card_id: &str, text: &str) -> KanbanResult<()> {
        Self::validate_card_id(card_id)?;
        let dir = self.existing_board_path(board_id)?;
        let _guard = self.locks.lock(board_id).await;
        AtomicWriter::write_atomic(&Self::card_body_path(&dir, card_id), text.as_bytes()).await
    }

    pub async fn load_card_meta(&self, board_id: &str, card_id: &str) -> KanbanResult<CardMeta> {
        Self::validate_card_id(card_id)?;
        let dir = self.existing_board_path(board_id)?;
        Self::read_meta_at(&dir, card_id).await
    }

    pub async fn save_card_meta(
        &self,
        board_id: &str,
        card_id: &str,
        meta: &CardMeta,
    ) -> KanbanResult<()> {
        Self::validate_card_id(card_id)?;
        let dir = self.existing_board_path(board_id)?;
        let _guard = self.locks.lock(board_id).await;
        Self::write_meta_at(&dir, card_id, meta).await
    }

    /// Record the previous text of a card description.
    pub async fn save_revision(
        &self,
        board_id: &str,
        card_id: &str,
        text: &str,
        user: Option<String>,
    ) -> KanbanResult<Revision> {
        Self::validate_card_id(card_id)?;
        let dir = self.existing_board_path(board_id)?;
        let _guard = self.locks.lock(board_id).await;

        let mut meta = Self::read_meta_at(&dir, card_id).await?;
        let revision = Revision::new(text, user);
        meta.push_revision(revision.clone());
        Self::write_meta_at(&dir, card_id, &meta).await?;
        Ok(revision)
    }

    /// Remove a card's body and meta files. The layout is saved separately by the caller.
    pub async fn delete_card(&self, board_id: &str, card_id: &str) -> KanbanResult<()> {
        Self::validate_card_id(card_id)?;
        let dir = self.existing_board_path(board_id)?;
        let _guard = self.locks.lock(board_id).await;

        for path in [
            Self::card_body_path(&dir, card_id),
            Self::card_meta_path(&dir, card_id),
        ] {
            match fs::remove_file(&path).await {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    // ---- users ----

    pub async fn read_users(&self, board_id: &str) -> KanbanResult<UserRegistry> {
        let dir = self.existing_board_path(board_id)?;
        Self::read_json_tolerant(&dir.join(USERS_FILE)).await
    }

    pub async fn save_users(&self, board_id: &str, users: &UserRegistry) -> KanbanResult<()> {
        let dir = self.existing_board_path(board_id)?;
        let _guard = self.locks.lock(board_id).await;
        Self::write_json(&dir.join(USERS_FILE), users).await
    }

    // ---- uploads ----

    /// Store an uploaded file under a cleaned, de-duplicated name and return its link.
    pub async fn store_upload(
        &self,
        board_id: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> KanbanResult<String> {
        let dir = self.existing_board_path(board_id)?;
        let _guard = self.locks.lock(board_id).await;

        let uploads = dir.join(UPLOADS_DIR);
        fs::create_dir_all(&uploads).await?;
        let filename = upload_filename(original_name, |name| uploads.join(name).exists());
        AtomicWriter::write_atomic(&uploads.join(&filename), bytes).await?;

        tracing::info!("Stored upload {} on board {}", filename, board_id);
        Ok(self.asset_url(board_id, &filename))
    }

    /// Write a binary asset at a path relative to the board's `uploads/`.
    pub async fn write_asset(&self, board_id: &str, relative: &str, bytes: &[u8]) -> KanbanResult<()> {
        let dir = self.existing_board_path(board_id)?;
        let path = Self::asset_path(&dir, relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        AtomicWriter::write_atomic(&path, bytes).await
    }

    pub fn asset_exists(&self, board_id: &str, relative: &str) -> bool {
        self.board_path(board_id)
            .and_then(|dir| Self::asset_path(&dir, relative))
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    // ---- helpers ----

    pub(crate) async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> KanbanResult<()> {
        let bytes = JsonSerializer::serialize(value)?;
        AtomicWriter::write_atomic(path, &bytes).await
    }

    /// Missing or unreadable documents fall back to their default.
    async fn read_json_tolerant<T: DeserializeOwned + Default>(path: &Path) -> KanbanResult<T> {
        match AtomicWriter::read_optional(path).await? {
            Some(bytes) => match JsonSerializer::deserialize(&bytes) {
                Ok(value) => Ok(value),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                    Ok(T::default())
                }
            },
            None => Ok(T::default()),
        }
    }
}

/// Stored title of the board in `dir`; `None` when the layout or its title is absent.
async fn listed_title(dir: &Path) -> KanbanResult<Option<String>> {
    let Some(bytes) = AtomicWriter::read_optional(&dir.join(LAYOUT_FILE)).await? else {
        return Ok(None);
    };
    let layout = JsonSerializer::deserialize::<BoardLayout>(&bytes)?;
    Ok(Some(layout.title).filter(|t| !t.is_empty()))
}

fn remove_tree(path: &Path) -> KanbanResult<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(path).follow_links(false).contents_first(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_dir() {
            std::fs::remove_dir(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
        removed += 1;
    }
    Ok(removed)
}
