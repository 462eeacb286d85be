pub mod move_card;
pub mod rename;
pub mod serialization;
pub mod store;

pub use move_card::MoveOutcome;
pub use rename::RenameOutcome;
pub use serialization::*;
pub use store::*;
