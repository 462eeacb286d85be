use crate::store::BoardStore;
use kanban_core::{slugify, KanbanError, KanbanResult};
use kanban_domain::BoardId;
use serde::Serialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub id: BoardId,
    pub title: String,
    /// Whether the board directory moved to a new id.
    pub renamed: bool,
}

impl BoardStore {
    /// Retitle a board and move it to the slug of the new title.
    ///
    /// The title is always updated in place, even when the new slug is taken
    /// and the move fails with [`KanbanError::Conflict`]. Asset links in card
    /// bodies embed the board id, so they are rewritten while the files are
    /// still reachable under the old directory, and only then is the
    /// directory renamed.
    pub async fn rename_board(&self, id: &str, new_title: &str) -> KanbanResult<RenameOutcome> {
        let old_dir = self.existing_board_path(id)?;
        let title = new_title.trim();
        let new_id = slugify(title);
        if new_id.is_empty() {
            return Err(KanbanError::InvalidInput(format!(
                "Title {:?} does not produce a usable board id",
                new_title
            )));
        }

        let _guards = self.locks().lock_pair(id, &new_id).await;

        let mut layout = self.read_layout_at(&old_dir, id).await?;
        layout.title = title.to_string();
        self.write_layout(&old_dir, &layout).await?;

        let moving = new_id != id;
        let new_dir = self.board_path(&new_id)?;
        if moving && new_dir.exists() {
            return Err(KanbanError::Conflict(format!(
                "A board with id {} already exists",
                new_id
            )));
        }

        if !moving {
            tracing::info!("Retitled board {} to {:?}", id, title);
            return Ok(RenameOutcome {
                id: id.to_string(),
                title: title.to_string(),
                renamed: false,
            });
        }

        let rewritten = rewrite_asset_links(
            &old_dir,
            &self.asset_link_prefix(id),
            &self.asset_link_prefix(&new_id),
        )
        .await?;
        fs::rename(&old_dir, &new_dir).await?;
        self.locks().forget(id);

        tracing::info!(
            "Renamed board {} to {} ({} card bodies relinked)",
            id,
            new_id,
            rewritten
        );
        Ok(RenameOutcome {
            id: new_id,
            title: title.to_string(),
            renamed: true,
        })
    }
}

/// Replace `from` with `to` in every card body of a board directory.
///
/// Bodies are treated as bytes so that content which is not valid UTF-8
/// survives untouched around the replaced links.
async fn rewrite_asset_links(dir: &Path, from: &str, to: &str) -> KanbanResult<usize> {
    let mut rewritten = 0;
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let content = fs::read(&path).await?;
        let Some(updated) = replace_bytes(&content, from.as_bytes(), to.as_bytes()) else {
            continue;
        };
        crate::store::AtomicWriter::write_atomic(&path, &updated).await?;
        rewritten += 1;
    }
    Ok(rewritten)
}

/// `None` when `from` does not occur in `haystack`.
fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Option<Vec<u8>> {
    if from.is_empty() {
        return None;
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    let mut found = false;
    while let Some(at) = rest.windows(from.len()).position(|w| w == from) {
        out.extend_from_slice(&rest[..at]);
        out.extend_from_slice(to);
        rest = &rest[at + from.len()..];
        found = true;
    }
    if !found {
        return None;
    }
    out.extend_from_slice(rest);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rename_moves_directory_and_relinks_bodies() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let id = store.create_board("Alpha", None).await.unwrap();
        assert_eq!(id, "alpha");
        store
            .save_card_body(&id, "c1", "See ![shot](uploads/alpha/uploads/x.png) here")
            .await
            .unwrap();
        store
            .save_card_body(&id, "c2", "mentions uploads/alphabet/uploads/y.png")
            .await
            .unwrap();

        let outcome = store.rename_board(&id, "Beta Project").await.unwrap();
        assert_eq!(
            outcome,
            RenameOutcome {
                id: "beta-project".to_string(),
                title: "Beta Project".to_string(),
                renamed: true,
            }
        );

        assert!(!dir.path().join("alpha").exists());
        assert_eq!(store.locks().len(), 1);
        let body = store.read_card_body("beta-project", "c1").await.unwrap();
        assert_eq!(body, "See ![shot](uploads/beta-project/uploads/x.png) here");
        let untouched = store.read_card_body("beta-project", "c2").await.unwrap();
        assert_eq!(untouched, "mentions uploads/alphabet/uploads/y.png");
        assert_eq!(
            store.read_layout("beta-project").await.unwrap().title,
            "Beta Project"
        );
    }

    #[tokio::test]
    async fn test_rename_same_slug_only_retitles() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let id = store.create_board("Alpha", None).await.unwrap();

        let outcome = store.rename_board(&id, "ALPHA").await.unwrap();
        assert!(!outcome.renamed);
        assert_eq!(outcome.id, "alpha");
        assert_eq!(store.read_layout("alpha").await.unwrap().title, "ALPHA");
    }

    #[tokio::test]
    async fn test_rename_onto_taken_slug_conflicts() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let alpha = store.create_board("Alpha", None).await.unwrap();
        store.create_board("Beta", None).await.unwrap();

        let err = store.rename_board(&alpha, "Beta").await.unwrap_err();
        assert!(matches!(err, KanbanError::Conflict(_)));
        assert!(dir.path().join("alpha").is_dir());
        assert_eq!(store.read_layout("alpha").await.unwrap().title, "Beta");
        assert_eq!(store.read_layout("beta").await.unwrap().title, "Beta");
    }

    #[tokio::test]
    async fn test_rename_relinks_bodies_that_are_not_utf8() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let id = store.create_board("Alpha", None).await.unwrap();
        let raw = [
            b"f\xff\xfe ".as_slice(),
            b"![x](uploads/alpha/uploads/x.png)\n".as_slice(),
        ]
        .concat();
        std::fs::write(dir.path().join("alpha").join("c1.md"), &raw).unwrap();
        std::fs::write(dir.path().join("alpha").join("c2.md"), [0x66u8, 0xff, 0xfe, 0x0a]).unwrap();

        let outcome = store.rename_board(&id, "Beta Project").await.unwrap();
        assert!(outcome.renamed);
        assert!(!dir.path().join("alpha").exists());

        let moved = dir.path().join("beta-project");
        let c1 = std::fs::read(moved.join("c1.md")).unwrap();
        assert_eq!(
            c1,
            [
                b"f\xff\xfe ".as_slice(),
                b"![x](uploads/beta-project/uploads/x.png)\n".as_slice(),
            ]
            .concat()
        );
        assert_eq!(
            std::fs::read(moved.join("c2.md")).unwrap(),
            vec![0x66, 0xff, 0xfe, 0x0a]
        );
    }

    #[test]
    fn test_replace_bytes() {
        assert_eq!(
            replace_bytes(b"a-x-b-x", b"x", b"yy"),
            Some(b"a-yy-b-yy".to_vec())
        );
        assert_eq!(replace_bytes(b"abc", b"z", b"y"), None);
    }

    #[tokio::test]
    async fn test_rename_to_unusable_title() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let alpha = store.create_board("Alpha", None).await.unwrap();

        let err = store.rename_board(&alpha, "???").await.unwrap_err();
        assert!(matches!(err, KanbanError::InvalidInput(_)));
    }
}
