//! Core library for the Repertoire practice tracker: an embedded SQLite
//! store for the song library, setlists, practice history, and audio-memo
//! references, plus the derived views built on top of it (weekly practice
//! chart, streak, song suggestions) and a portable JSON backup codec.
//!
//! The public modules keep an intentionally small API so the `bin` target as
//! well as external tooling can reuse the same pieces.

pub mod backup;
pub mod db;
pub mod models;
pub mod repo;
pub mod stats;
pub mod suggest;

/// The store handle most callers want, with its configuration knobs.
pub use repo::{Repertoire, StoreOptions};

/// Domain types that move through every layer.
pub use models::{AudioMemo, Instrument, PracticeSession, Setlist, SetlistItem, Song, SongStatus};

/// Insert results that distinguish "added" from "already there".
pub use db::AddOutcome;

/// Derived analytics returned by [`Repertoire::practice_stats`].
pub use stats::{DayBucket, PracticeStats};

/// The backup document and its validation errors.
pub use backup::{BackupError, SNAPSHOT_VERSION, Snapshot};
