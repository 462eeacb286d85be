use kanban_domain::AttachmentRef;
use kanban_persistence::UPLOADS_DIR;
use std::collections::HashMap;

use crate::trello::TrelloCard;

/// Attachments of an export resolved to their deterministic local file names.
///
/// Built before anything is downloaded, so cover paths can be written into
/// the layout while the binaries are still remote.
#[derive(Debug, Default)]
pub struct AttachmentIndex {
    by_id: HashMap<String, AttachmentRef>,
}

impl AttachmentIndex {
    pub fn from_cards<'a>(cards: impl IntoIterator<Item = &'a TrelloCard>) -> Self {
        let by_id = cards
            .into_iter()
            .flat_map(Self::for_card)
            .map(|a| (a.id.clone(), a))
            .collect();
        Self { by_id }
    }

    /// Attachments of one card in declaration order. Entries without a URL
    /// cannot be fetched and are left out.
    pub fn for_card(card: &TrelloCard) -> Vec<AttachmentRef> {
        card.attachments
            .iter()
            .filter_map(|a| {
                let url = a.url.as_deref().filter(|u| !u.is_empty())?;
                Some(AttachmentRef::new(&a.id, a.name.as_deref(), url))
            })
            .collect()
    }

    pub fn get(&self, attachment_id: &str) -> Option<&AttachmentRef> {
        self.by_id.get(attachment_id)
    }

    /// Board-relative path of the cover image for `card`, if it names one.
    pub fn cover_path(&self, card: &TrelloCard) -> Option<String> {
        let cover_id = card.id_attachment_cover.as_deref()?;
        self.get(cover_id)
            .map(|a| format!("{}/{}", UPLOADS_DIR, a.filename()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
