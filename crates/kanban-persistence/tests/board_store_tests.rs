use chrono::NaiveDate;
use kanban_core::KanbanError;
use kanban_domain::{BoardLayout, BoardList, CardStub, ChecklistSummary, Label};
use kanban_persistence::{BoardStore, LAYOUT_FILE};
use std::fs;
use tempfile::tempdir;

fn rich_layout(title: &str) -> BoardLayout {
    let mut layout = BoardLayout::new(title);

    let mut todo = BoardList::new("todo", "Todo");
    let mut first = CardStub::new("c1", "Draft proposal");
    first.labels = vec![Label::new("green", "Ready"), Label::new("red", "Urgent")];
    first.set_due_day(NaiveDate::from_ymd_opt(2024, 5, 1));
    first.assignees = vec!["u1".to_string(), "ghost".to_string()];
    first.checklist = Some(ChecklistSummary { total: 3, done: 1 });
    first
        .extra
        .insert("color".to_string(), serde_json::json!("amber"));
    todo.cards.push(first);
    todo.cards.push(CardStub::new("c2", "Review"));

    let mut done = BoardList::new("done", "Done");
    done.cards.push(CardStub::new("c3", "Ship"));

    layout.lists = vec![todo, done];
    layout.archive.push(CardStub::new("c0", "Old idea"));
    layout
}

#[tokio::test]
async fn test_load_then_save_round_trips_layout() {
    let dir = tempdir().unwrap();
    let store = BoardStore::new(dir.path());
    let id = store.create_board("Round Trip", None).await.unwrap();

    let original = rich_layout("Round Trip");
    store.save_layout(&id, &original).await.unwrap();
    for card in original.cards() {
        store
            .save_card_body(&id, &card.id, &format!("body of {}", card.id))
            .await
            .unwrap();
    }

    let loaded = store.load_board(&id).await.unwrap();
    store.save_layout(&id, &loaded).await.unwrap();
    let reloaded = store.read_layout(&id).await.unwrap();

    assert_eq!(reloaded, original);

    // bodies come back once re-attached
    let hydrated = store.load_board(&id).await.unwrap();
    let bodies: Vec<_> = hydrated
        .cards()
        .map(|c| c.description.clone().unwrap_or_default())
        .collect();
    assert_eq!(bodies, vec!["body of c1", "body of c2", "body of c3", "body of c0"]);
}

#[tokio::test]
async fn test_dangling_assignee_does_not_break_loading() {
    let dir = tempdir().unwrap();
    let store = BoardStore::new(dir.path());
    let id = store.create_board("Soft refs", None).await.unwrap();
    store.save_layout(&id, &rich_layout("Soft refs")).await.unwrap();

    let board = store.load_board(&id).await.unwrap();
    let users = store.read_users(&id).await.unwrap();
    let card = board.find_card("c1").unwrap();
    let resolved: Vec<_> = card
        .assignees
        .iter()
        .map(|uid| users.display_name(uid))
        .collect();
    assert_eq!(resolved, vec![None, None]);
}

#[tokio::test]
async fn test_layout_written_by_older_clients_is_accepted() {
    let dir = tempdir().unwrap();
    let store = BoardStore::new(dir.path());
    let id = store.create_board("Legacy", None).await.unwrap();
    fs::write(
        dir.path().join(&id).join(LAYOUT_FILE),
        r#"{"lists": [{"id": "l1", "title": "Start", "cards": [
            {"id": "c9", "title": "Legacy", "labels": ["green"], "dueDate": "2024-02-03"}
        ]}]}"#,
    )
    .unwrap();

    let board = store.load_board(&id).await.unwrap();
    assert_eq!(board.title, "Legacy");
    let card = &board.lists[0].cards[0];
    assert_eq!(card.labels, vec![Label::new("green", "Green")]);
    assert_eq!(card.due_day(), NaiveDate::from_ymd_opt(2024, 2, 3));
    assert_eq!(card.description.as_deref(), Some(""));
}

#[tokio::test]
async fn test_round_trip_keeps_stored_dates_verbatim() {
    let dir = tempdir().unwrap();
    let store = BoardStore::new(dir.path());
    let id = store.create_board("Dates", None).await.unwrap();
    let layout_path = dir.path().join(&id).join(LAYOUT_FILE);
    fs::write(
        &layout_path,
        r#"{"title": "Dates", "lists": [{"id": "l1", "title": "Start", "cards": [
            {"id": "c1", "title": "Timed", "labels": [], "dueDate": "2024-03-01T09:30:00Z"},
            {"id": "c2", "title": "Vague", "labels": [], "dueDate": "next week", "startDate": "soon"},
            {"id": "c3", "title": "Numeric", "labels": [], "dueDate": 20240301}
        ]}], "archive": []}"#,
    )
    .unwrap();

    let board = store.load_board(&id).await.unwrap();
    assert_eq!(
        board.lists[0].cards[0].due_day(),
        NaiveDate::from_ymd_opt(2024, 3, 1)
    );
    store.save_layout(&id, &board).await.unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&layout_path).unwrap()).unwrap();
    let cards = &saved["lists"][0]["cards"];
    assert_eq!(cards[0]["dueDate"], "2024-03-01T09:30:00Z");
    assert_eq!(cards[1]["dueDate"], "next week");
    assert_eq!(cards[1]["startDate"], "soon");
    assert_eq!(cards[2]["dueDate"], 20240301);
}

#[tokio::test]
async fn test_corrupt_layout_is_an_error() {
    let dir = tempdir().unwrap();
    let store = BoardStore::new(dir.path());
    let id = store.create_board("Broken", None).await.unwrap();
    fs::write(dir.path().join(&id).join(LAYOUT_FILE), "{ nope").unwrap();

    let err = store.load_board(&id).await.unwrap_err();
    assert!(matches!(err, KanbanError::Serialization(_)));
}

#[tokio::test]
async fn test_delete_board_removes_nested_tree() {
    let dir = tempdir().unwrap();
    let store = BoardStore::new(dir.path());
    let id = store.create_board("Doomed", None).await.unwrap();
    store.save_card_body(&id, "c1", "x").await.unwrap();
    store.write_asset(&id, "avatars/u1.png", b"png").await.unwrap();
    store.store_upload(&id, "a.txt", b"a").await.unwrap();

    store.delete_board(&id).await.unwrap();
    assert!(!dir.path().join(&id).exists());
    assert!(store.list_boards().await.unwrap().is_empty());

    let err = store.delete_board(&id).await.unwrap_err();
    assert!(matches!(err, KanbanError::NotFound(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_delete_board_refuses_symlink() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("keep.txt"), "precious").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("sneaky")).unwrap();

    let store = BoardStore::new(dir.path());
    let err = store.delete_board("sneaky").await.unwrap_err();
    assert!(matches!(err, KanbanError::InvalidInput(_)));
    assert!(outside.path().join("keep.txt").exists());
}

#[tokio::test]
async fn test_invalid_ids_are_rejected_before_touching_disk() {
    let dir = tempdir().unwrap();
    let store = BoardStore::new(dir.path());

    let err = store.load_board("../etc").await.unwrap_err();
    assert!(matches!(err, KanbanError::InvalidInput(_)));

    let id = store.create_board("Valid", None).await.unwrap();
    let err = store.save_card_body(&id, "../x", "escape").await.unwrap_err();
    assert!(matches!(err, KanbanError::InvalidInput(_)));
}

#[tokio::test]
async fn test_card_never_in_list_and_archive_after_move() {
    let dir = tempdir().unwrap();
    let store = BoardStore::new(dir.path());
    let a = store.create_board("A", None).await.unwrap();
    let b = store.create_board("B", None).await.unwrap();
    store.save_layout(&a, &rich_layout("A")).await.unwrap();

    store.move_card("c2", &a, &b).await.unwrap();

    for id in [&a, &b] {
        let layout = store.read_layout(id).await.unwrap();
        for card in layout.lists.iter().flat_map(|l| l.cards.iter()) {
            assert!(!layout.is_archived(&card.id), "{} in list and archive", card.id);
        }
    }
    let source = store.read_layout(&a).await.unwrap();
    assert!(source.find_card("c2").is_none());
    let target = store.read_layout(&b).await.unwrap();
    let holders = target
        .lists
        .iter()
        .filter(|l| l.position_of("c2").is_some())
        .count();
    assert_eq!(holders, 1);
}
