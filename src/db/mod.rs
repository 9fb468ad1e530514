//! Persistence layer split across logical submodules, one per entity, plus
//! the connection/migration plumbing. Everything here is a thin typed shim
//! over SQLite; derived views (stats, suggestions) and the backup codec live
//! in their own modules and read through these functions.

pub mod connection;
pub mod memos;
pub mod sessions;
pub mod setlists;
pub mod songs;

pub use connection::{default_db_path, open, open_default, open_in_memory};

/// Result of an insert that treats "already there" as a normal outcome
/// rather than an error: adding a song the library already has, or adding a
/// song to a setlist that already contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
}

impl AddOutcome {
    pub fn is_added(self) -> bool {
        matches!(self, AddOutcome::Added)
    }
}
