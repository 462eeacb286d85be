pub mod atomic_writer;
pub mod board_lock;
pub mod board_store;

pub use atomic_writer::AtomicWriter;
pub use board_lock::{BoardGuard, BoardLocks};
pub use board_store::{BoardStore, AVATARS_DIR, LAYOUT_FILE, UPLOADS_DIR, USERS_FILE};
