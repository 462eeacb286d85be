pub mod attachment;
pub mod board;
pub mod card;
pub mod card_meta;
pub mod label;
pub mod list;
pub mod user;

pub use attachment::{attachment_filename, clean_name, upload_filename, AttachmentRef};
pub use board::{BoardId, BoardLayout, BoardSummary};
pub use card::{parse_day, CardId, CardStub, ChecklistSummary};
pub use card_meta::{CardMeta, CheckState, Checklist, ChecklistItem, Comment, Revision};
pub use label::Label;
pub use list::BoardList;
pub use user::{User, UserRegistry};
