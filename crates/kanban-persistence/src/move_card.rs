use crate::store::BoardStore;
use kanban_core::{KanbanError, KanbanResult, LogEntry, Loggable};
use kanban_domain::BoardId;
use serde::Serialize;
use tokio::fs;

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub card_id: String,
    pub from_board: BoardId,
    pub to_board: BoardId,
    pub activity: LogEntry,
}

impl BoardStore {
    /// Move a card from one of `from`'s lists to the top of `to`'s first list.
    ///
    /// The card keeps its id; its body and meta files follow it. The two
    /// layouts are written one after the other, so a crash in between can
    /// leave the card listed on both boards or on neither; readers tolerate
    /// either state. Asset links inside the body keep pointing at the source
    /// board's uploads.
    pub async fn move_card(&self, card_id: &str, from: &str, to: &str) -> KanbanResult<MoveOutcome> {
        Self::validate_card_id(card_id)?;
        if from == to {
            return Err(KanbanError::InvalidInput(format!(
                "Card {} is already on board {}",
                card_id, from
            )));
        }
        let from_dir = self.existing_board_path(from)?;
        let to_dir = self
            .existing_board_path(to)
            .map_err(|_| KanbanError::NotFound(format!("Target board {}", to)))?;

        let _guards = self.locks().lock_pair(from, to).await;

        let mut source = self.read_layout_at(&from_dir, from).await?;
        let card = source
            .take_from_lists(card_id)
            .ok_or_else(|| KanbanError::NotFound(format!("Card {} on board {}", card_id, from)))?;

        let mut target = self.read_layout_at(&to_dir, to).await?;
        target.push_front_of_first_list(card);

        for (src, dst) in [
            (
                Self::card_body_path(&from_dir, card_id),
                Self::card_body_path(&to_dir, card_id),
            ),
            (
                Self::card_meta_path(&from_dir, card_id),
                Self::card_meta_path(&to_dir, card_id),
            ),
        ] {
            if src.exists() {
                fs::rename(&src, &dst).await?;
            }
        }

        self.write_layout(&from_dir, &source).await?;
        self.write_layout(&to_dir, &target).await?;

        let activity = LogEntry::new(format!(
            "Moved from board '{}' to '{}'",
            source.title, target.title
        ));
        let mut meta = Self::read_meta_at(&to_dir, card_id).await?;
        meta.add_log(activity.clone());
        Self::write_meta_at(&to_dir, card_id, &meta).await?;

        tracing::info!("Moved card {} from {} to {}", card_id, from, to);
        Ok(MoveOutcome {
            card_id: card_id.to_string(),
            from_board: from.to_string(),
            to_board: to.to_string(),
            activity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_domain::{BoardLayout, BoardList, CardStub};
    use tempfile::tempdir;

    async fn board_with_card(store: &BoardStore, title: &str, card: &str) -> String {
        let id = store.create_board(title, None).await.unwrap();
        let mut layout = BoardLayout::new(title);
        let mut list = BoardList::new("todo", "Todo");
        list.cards.push(CardStub::new(card, "Moving card"));
        list.cards.push(CardStub::new(format!("{}-stay", card), "Staying card"));
        layout.lists.push(list);
        store.save_layout(&id, &layout).await.unwrap();
        store.save_card_body(&id, card, "body text").await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_move_card_relocates_stub_and_files() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let from = board_with_card(&store, "Source", "c1").await;
        let to = store.create_board("Destination", None).await.unwrap();

        let outcome = store.move_card("c1", &from, &to).await.unwrap();
        assert!(outcome.activity.text.contains("Source"));

        let source = store.load_board(&from).await.unwrap();
        assert!(source.find_card("c1").is_none());
        assert!(!source.is_archived("c1"));
        assert!(source.find_card("c1-stay").is_some());

        let target = store.load_board(&to).await.unwrap();
        assert_eq!(target.lists.len(), 1);
        assert_eq!(target.lists[0].title, "Inbox");
        assert_eq!(target.lists[0].cards[0].id, "c1");
        assert_eq!(target.lists[0].cards[0].description.as_deref(), Some("body text"));
        assert!(!dir.path().join(&from).join("c1.md").exists());

        let meta = store.load_card_meta(&to, "c1").await.unwrap();
        assert_eq!(meta.activity.len(), 1);
        assert_eq!(
            meta.activity[0].text,
            "Moved from board 'Source' to 'Destination'"
        );
    }

    #[tokio::test]
    async fn test_move_card_into_existing_first_list() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let from = board_with_card(&store, "Left", "a1").await;
        let to = board_with_card(&store, "Right", "b1").await;

        store.move_card("a1", &from, &to).await.unwrap();

        let target = store.read_layout(&to).await.unwrap();
        let ids: Vec<_> = target.lists[0].card_ids().cloned().collect();
        assert_eq!(ids, vec!["a1", "b1", "b1-stay"]);
        let occurrences = target.cards().filter(|c| c.id == "a1").count();
        assert_eq!(occurrences, 1);
    }

    #[tokio::test]
    async fn test_move_missing_card_is_not_found() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let from = board_with_card(&store, "Source", "c1").await;
        let to = store.create_board("Destination", None).await.unwrap();

        let err = store.move_card("nope", &from, &to).await.unwrap_err();
        assert!(matches!(err, KanbanError::NotFound(_)));
        // nothing was written
        assert!(store.read_layout(&from).await.unwrap().find_card("c1").is_some());
    }

    #[tokio::test]
    async fn test_move_to_missing_board_is_not_found() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let from = board_with_card(&store, "Source", "c1").await;

        let err = store.move_card("c1", &from, "ghost").await.unwrap_err();
        assert!(matches!(err, KanbanError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_move_onto_same_board_is_rejected() {
        let dir = tempdir().unwrap();
        let store = BoardStore::new(dir.path());
        let from = board_with_card(&store, "Source", "c1").await;

        let err = store.move_card("c1", &from, &from).await.unwrap_err();
        assert!(matches!(err, KanbanError::InvalidInput(_)));
    }
}
