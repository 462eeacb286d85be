//! Import of Trello board exports into the file-backed board store.
//!
//! The structural import ([`TrelloImporter::import`]) builds a complete board
//! from an export document, fetching only member avatars. Attachment binaries
//! are fetched by the companion [`TrelloImporter::import_attachments`] step;
//! because attachment file names are a pure function of the export, cover
//! images written by the first step point at the files the second step
//! downloads.

pub mod attachments;
pub mod fetcher;
pub mod importer;
pub mod replay;
pub mod report;
pub mod trello;

pub use attachments::AttachmentIndex;
pub use fetcher::{fetch_guarded, ContentFetcher, HttpFetcher};
pub use importer::{ImportOptions, TrelloImporter};
pub use replay::{replay_actions, CardHistory};
pub use report::{FetchKind, FetchOutcome, FetchStatus, ImportReport};
pub use trello::TrelloExport;
