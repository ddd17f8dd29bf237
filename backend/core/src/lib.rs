//! `crossgrid-core`: the shared-grid data model.
//!
//! Provides:
//! - The per-cell last-writer-wins register and board merge
//! - Durable board storage with atomic replace
//! - The public view sent to clients and the inbound command frames

pub mod board;
pub mod cell;
pub mod error;
pub mod game_name;
pub mod protocol;
pub mod storage;
pub mod view;

pub use board::{Board, Layout, MergeOutcome, MAX_DIMENSION};
pub use cell::{truncate_name, Cell, CellUpdate, NAME_MAX_LENGTH};
pub use error::{GridError, StorageError};
pub use game_name::is_valid_game_name;
pub use protocol::{ClientCommand, UNKNOWN_GAME};
pub use storage::{FsStorage, GameStore, MemoryStorage, Storage};
pub use view::PublicView;
