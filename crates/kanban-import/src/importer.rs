use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use kanban_core::{slugify, truncate_slug, AppConfig, KanbanError, KanbanResult};
use kanban_domain::label::FALLBACK_COLOR;
use kanban_domain::{
    clean_name, parse_day, AttachmentRef, BoardLayout, BoardList, CardMeta, CardStub, CheckState,
    Checklist, ChecklistItem, Label, UserRegistry,
};
use kanban_persistence::{BoardStore, AVATARS_DIR, UPLOADS_DIR};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::attachments::AttachmentIndex;
use crate::fetcher::{fetch_guarded, ContentFetcher};
use crate::replay::replay_actions;
use crate::report::{FetchKind, FetchOutcome, FetchStatus, ImportReport};
use crate::trello::{TrelloCard, TrelloChecklist, TrelloExport, TrelloLabel, TrelloMember};

const SLUG_MAX_LEN: usize = 30;
const FALLBACK_SLUG: &str = "board";
const DEFAULT_TITLE: &str = "Imported board";
const ATTACHMENTS_HEADING: &str = "### Attachments";

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Date used for the board id suffix.
    pub today: NaiveDate,
    pub cancel: CancellationToken,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            today: Utc::now().date_naive(),
            cancel: CancellationToken::new(),
        }
    }
}

impl ImportOptions {
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Default::default()
        }
    }
}

/// Turns Trello exports into boards of a [`BoardStore`].
pub struct TrelloImporter<'a, F> {
    store: &'a BoardStore,
    fetcher: F,
    timeout: Duration,
    concurrency: usize,
    avatar_url_template: String,
}

impl<'a, F: ContentFetcher> TrelloImporter<'a, F> {
    pub fn new(store: &'a BoardStore, fetcher: F, config: &AppConfig) -> Self {
        Self {
            store,
            fetcher,
            timeout: config.effective_fetch_timeout(),
            concurrency: config.effective_fetch_concurrency(),
            avatar_url_template: config.effective_avatar_url_template().to_string(),
        }
    }

    /// `slug(name)` truncated to 30 characters plus a `-yymmdd` suffix.
    pub fn board_slug(name: &str, today: NaiveDate) -> String {
        let base = truncate_slug(&slugify(name), SLUG_MAX_LEN);
        let base = if base.is_empty() {
            FALLBACK_SLUG.to_string()
        } else {
            base
        };
        format!("{}-{}", base, today.format("%y%m%d"))
    }

    pub async fn import_file(&self, path: &Path, options: &ImportOptions) -> KanbanResult<ImportReport> {
        let export = TrelloExport::from_file(path).await?;
        self.import(&export, options).await
    }

    /// Create a new board from `export`.
    ///
    /// Avatars are fetched; attachments are not (see
    /// [`import_attachments`](Self::import_attachments)). A failed or
    /// cancelled import leaves no board behind.
    pub async fn import(&self, export: &TrelloExport, options: &ImportOptions) -> KanbanResult<ImportReport> {
        if options.cancel.is_cancelled() {
            return Err(KanbanError::Cancelled);
        }

        let title = export
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        let board_id = self
            .store
            .unique_board_id(&Self::board_slug(&title, options.today));
        self.store.provision_board(&board_id).await?;
        tracing::info!("Importing Trello board '{}' as {}", title, board_id);

        match self.populate(&board_id, &title, export, options).await {
            Ok(report) => {
                tracing::info!(
                    "Imported {} cards ({} archived) into {}",
                    report.cards,
                    report.archived_cards,
                    board_id
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!("Import into {} failed: {}; removing partial board", board_id, err);
                if let Err(cleanup) = self.store.delete_board(&board_id).await {
                    tracing::error!("Failed to remove partial board {}: {}", board_id, cleanup);
                }
                Err(err)
            }
        }
    }

    async fn populate(
        &self,
        board_id: &str,
        title: &str,
        export: &TrelloExport,
        options: &ImportOptions,
    ) -> KanbanResult<ImportReport> {
        let mut report = ImportReport::new(board_id, title);

        let mut users = self
            .seed_users(board_id, &export.members, options, &mut report)
            .await?;
        let mut histories = replay_actions(&export.actions, &mut users);

        let mut layout = BoardLayout::new(title);
        let mut list_index = HashMap::new();
        for list in export.lists.iter().filter(|l| !l.closed) {
            list_index.insert(list.id.as_str(), layout.lists.len());
            layout.lists.push(BoardList::new(&list.id, &list.name));
        }

        let checklists = group_checklists(&export.checklists);
        let attachments = AttachmentIndex::from_cards(&export.cards);

        let mut cards: Vec<&TrelloCard> = export.cards.iter().collect();
        cards.sort_by(|a, b| a.pos.total_cmp(&b.pos));

        for card in cards {
            if options.cancel.is_cancelled() {
                return Err(KanbanError::Cancelled);
            }
            if let Err(err) = BoardStore::validate_card_id(&card.id) {
                tracing::warn!("Skipping card {:?}: {}", card.name, err);
                report.skipped_cards += 1;
                continue;
            }

            let mut meta = histories
                .remove(&card.id)
                .unwrap_or_default()
                .into_meta();
            meta.assigned_to = card.id_members.clone();
            meta.created_at = created_at_from_id(&card.id);
            meta.checklists = checklists.get(card.id.as_str()).cloned().unwrap_or_default();

            let stub = card_stub(card, &meta, &attachments, &export.label_names);
            let body = render_body(&card.desc, &meta.checklists);
            self.store.save_card_body(board_id, &card.id, &body).await?;
            self.store.save_card_meta(board_id, &card.id, &meta).await?;

            match list_index.get(card.id_list.as_str()) {
                Some(&index) if !card.closed => layout.lists[index].cards.push(stub),
                _ => layout.archive.push(stub),
            }
        }

        report.lists = layout.lists.len();
        report.cards = layout.lists.iter().map(|l| l.cards.len()).sum();
        report.archived_cards = layout.archive.len();
        report.users = users.len();

        self.store.save_layout(board_id, &layout).await?;
        self.store.save_users(board_id, &users).await?;
        Ok(report)
    }

    /// Register export members, fetching avatars through the bounded pool.
    async fn seed_users(
        &self,
        board_id: &str,
        members: &[TrelloMember],
        options: &ImportOptions,
        report: &mut ImportReport,
    ) -> KanbanResult<UserRegistry> {
        let jobs: Vec<(String, String)> = members
            .iter()
            .filter_map(|m| self.avatar_url(m).map(|url| (m.id.clone(), url)))
            .collect();

        let outcomes: Vec<KanbanResult<FetchOutcome>> = stream::iter(jobs)
            .map(|(user_id, url)| self.fetch_avatar(board_id, user_id, url, &options.cancel))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut avatars = HashMap::new();
        for outcome in outcomes {
            let outcome = outcome?;
            if let FetchStatus::Fetched { path } = &outcome.status {
                avatars.insert(outcome.subject.clone(), path.clone());
            }
            report.fetches.push(outcome);
        }

        let mut users = UserRegistry::new();
        for member in members {
            let mut user = member.to_user();
            user.avatar = avatars.remove(&member.id);
            users.insert(user);
        }
        Ok(users)
    }

    fn avatar_url(&self, member: &TrelloMember) -> Option<String> {
        if let Some(base) = member.avatar_url.as_deref().filter(|u| !u.is_empty()) {
            if base.ends_with(".png") {
                return Some(base.to_string());
            }
            return Some(format!("{}/170.png", base.trim_end_matches('/')));
        }
        let hash = member.avatar_hash.as_deref().filter(|h| !h.is_empty())?;
        Some(
            self.avatar_url_template
                .replace("{id}", &member.id)
                .replace("{hash}", hash),
        )
    }

    async fn fetch_avatar(
        &self,
        board_id: &str,
        user_id: String,
        url: String,
        cancel: &CancellationToken,
    ) -> KanbanResult<FetchOutcome> {
        let file = format!("{}/{}.png", AVATARS_DIR, clean_name(&user_id));
        let status = match self.download(board_id, &url, &file, cancel).await {
            Ok(()) => FetchStatus::Fetched {
                path: format!("{}/{}", UPLOADS_DIR, file),
            },
            Err(KanbanError::Cancelled) => return Err(KanbanError::Cancelled),
            Err(err) => {
                tracing::warn!("Avatar for {} unavailable: {}", user_id, err);
                FetchStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };
        Ok(FetchOutcome {
            kind: FetchKind::Avatar,
            subject: user_id,
            url,
            status,
        })
    }

    async fn download(
        &self,
        board_id: &str,
        url: &str,
        relative: &str,
        cancel: &CancellationToken,
    ) -> KanbanResult<()> {
        let bytes = fetch_guarded(&self.fetcher, url, self.timeout, cancel).await?;
        self.store.write_asset(board_id, relative, &bytes).await?;
        tracing::debug!("Stored {} ({} bytes) on {}", relative, bytes.len(), board_id);
        Ok(())
    }

    /// Download the attachments of every export card present on `board_id`
    /// and link them from the card bodies. Files already on disk are kept,
    /// so running this twice fetches nothing new.
    pub async fn import_attachments(
        &self,
        board_id: &str,
        export: &TrelloExport,
        options: &ImportOptions,
    ) -> KanbanResult<ImportReport> {
        let layout = self.store.read_layout(board_id).await?;
        let mut report = ImportReport::new(board_id, layout.title.clone());
        report.lists = layout.lists.len();
        report.archived_cards = layout.archive.len();
        report.users = self.store.read_users(board_id).await?.len();

        let mut cards: Vec<&TrelloCard> = export
            .cards
            .iter()
            .filter(|c| layout.find_card(&c.id).is_some())
            .collect();
        cards.sort_by(|a, b| a.pos.total_cmp(&b.pos));
        report.cards = cards.len();

        let jobs: Vec<(&str, AttachmentRef)> = cards
            .iter()
            .flat_map(|&card| {
                AttachmentIndex::for_card(card)
                    .into_iter()
                    .map(move |a| (card.id.as_str(), a))
            })
            .collect();

        let outcomes: Vec<KanbanResult<FetchOutcome>> = stream::iter(&jobs)
            .map(|(card_id, attachment)| {
                self.fetch_attachment(board_id, card_id, attachment, &options.cancel)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut available: HashMap<&str, Vec<&AttachmentRef>> = HashMap::new();
        for ((card_id, attachment), outcome) in jobs.iter().zip(outcomes) {
            let outcome = outcome?;
            if outcome.local_path().is_some() {
                available.entry(*card_id).or_default().push(attachment);
            }
            report.fetches.push(outcome);
        }

        for card in &cards {
            if let Some(refs) = available.get(card.id.as_str()) {
                self.link_attachments(board_id, &card.id, refs).await?;
            }
        }

        tracing::info!(
            "Attachment import for {}: {} fetches, {} failed",
            board_id,
            report.fetches.len(),
            report.failed_fetches().count()
        );
        Ok(report)
    }

    async fn fetch_attachment(
        &self,
        board_id: &str,
        card_id: &str,
        attachment: &AttachmentRef,
        cancel: &CancellationToken,
    ) -> KanbanResult<FetchOutcome> {
        let file = attachment.filename();
        let path = format!("{}/{}", UPLOADS_DIR, file);
        let status = if self.store.asset_exists(board_id, &file) {
            FetchStatus::Skipped { path }
        } else {
            match self.download(board_id, &attachment.url, &file, cancel).await {
                Ok(()) => FetchStatus::Fetched { path },
                Err(KanbanError::Cancelled) => return Err(KanbanError::Cancelled),
                Err(err) => {
                    tracing::warn!("Attachment {} of {} unavailable: {}", attachment.id, card_id, err);
                    FetchStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            }
        };
        Ok(FetchOutcome {
            kind: FetchKind::Attachment,
            subject: card_id.to_string(),
            url: attachment.url.clone(),
            status,
        })
    }

    async fn link_attachments(
        &self,
        board_id: &str,
        card_id: &str,
        attachments: &[&AttachmentRef],
    ) -> KanbanResult<()> {
        let body = self.store.read_card_body(board_id, card_id).await?;
        let links: Vec<String> = attachments
            .iter()
            .map(|a| self.attachment_link(board_id, a))
            .filter(|link| !body.contains(link.as_str()))
            .collect();
        if links.is_empty() {
            return Ok(());
        }

        let mut updated = body.trim_end().to_string();
        if !updated.contains(ATTACHMENTS_HEADING) {
            if !updated.is_empty() {
                updated.push_str("\n\n");
            }
            updated.push_str(ATTACHMENTS_HEADING);
        }
        updated.push('\n');
        for link in links {
            updated.push_str("- ");
            updated.push_str(&link);
            updated.push('\n');
        }
        self.store.save_card_body(board_id, card_id, &updated).await
    }

    fn attachment_link(&self, board_id: &str, attachment: &AttachmentRef) -> String {
        let url = self.store.asset_url(board_id, &attachment.filename());
        if attachment.is_image() {
            format!("![{}]({})", attachment.name, url)
        } else {
            format!("[{}]({})", attachment.name, url)
        }
    }
}

fn card_stub(
    card: &TrelloCard,
    meta: &CardMeta,
    attachments: &AttachmentIndex,
    label_names: &HashMap<String, String>,
) -> CardStub {
    let mut stub = CardStub::new(&card.id, &card.name);
    stub.labels = card
        .labels
        .iter()
        .map(|l| import_label(l, label_names))
        .collect();
    stub.set_due_day(card.due.as_deref().and_then(parse_day));
    stub.set_start_day(card.start.as_deref().and_then(parse_day));
    stub.assignees = card.id_members.clone();
    stub.cover = attachments.cover_path(card);
    stub.created_at = meta.created_at;
    stub.checklist = meta.checklist_summary();
    stub
}

/// Label name: its own, else the board vocabulary for its colour, else the
/// capitalised colour.
fn import_label(label: &TrelloLabel, label_names: &HashMap<String, String>) -> Label {
    let color = label.color.as_deref().filter(|c| !c.is_empty());
    let name = label
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            color
                .and_then(|c| label_names.get(c))
                .map(String::as_str)
                .filter(|n| !n.trim().is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| Label::capitalized(color.unwrap_or(FALLBACK_COLOR)));
    Label::new(Label::palette_color(color), name)
}

fn group_checklists(checklists: &[TrelloChecklist]) -> HashMap<&str, Vec<Checklist>> {
    let mut by_card: HashMap<&str, Vec<Checklist>> = HashMap::new();
    for checklist in checklists {
        let items = checklist
            .check_items
            .iter()
            .map(|item| ChecklistItem {
                id: item.id.clone(),
                name: item.name.clone(),
                state: if item.state == "complete" {
                    CheckState::Complete
                } else {
                    CheckState::Incomplete
                },
            })
            .collect();
        by_card
            .entry(checklist.id_card.as_str())
            .or_default()
            .push(Checklist {
                id: checklist.id.clone(),
                name: checklist.name.clone(),
                items,
            });
    }
    by_card
}

fn render_body(desc: &str, checklists: &[Checklist]) -> String {
    let mut body = desc.to_string();
    for checklist in checklists {
        body.push_str(&checklist.to_markdown());
    }
    body
}

/// Trello ids start with the creation time as 8 hex digits of Unix seconds.
fn created_at_from_id(id: &str) -> Option<DateTime<Utc>> {
    let seconds = u32::from_str_radix(id.get(..8)?, 16).ok()?;
    DateTime::from_timestamp(i64::from(seconds), 0)
}
