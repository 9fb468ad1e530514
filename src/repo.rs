//! The store handle the rest of the application talks to. `Repertoire` owns
//! the SQLite connection and is constructed once and passed around, rather
//! than living in a process-wide global.
//!
//! The failure model is asymmetric on purpose: writes propagate errors so the
//! caller can tell the user something went wrong, while reads log and fall
//! back to an empty result so a screen always has something safe to render.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::Connection;
use tracing::warn;

use crate::backup::{self, Snapshot};
use crate::db::{AddOutcome, connection, memos, sessions, setlists, songs};
use crate::models::{AudioMemo, Instrument, PracticeSession, Setlist, Song, SongStatus};
use crate::stats::{self, PracticeStats};
use crate::suggest;

/// Behavioral knobs, injected at open time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Whether one song may appear in the same setlist more than once. Off by
    /// default: repeat adds are treated as taps on an already-added song.
    pub allow_duplicate_setlist_entries: bool,
}

/// Handle to the on-device library. All reads and writes go through here.
pub struct Repertoire {
    conn: Connection,
    options: StoreOptions,
}

impl Repertoire {
    /// Open (and migrate) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Repertoire {
            conn: connection::open(path)?,
            options: StoreOptions::default(),
        })
    }

    /// Open the store at the default per-user location.
    pub fn open_default() -> Result<Self> {
        Ok(Repertoire {
            conn: connection::open_default()?,
            options: StoreOptions::default(),
        })
    }

    /// In-memory store for tests and throwaway tooling.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Repertoire {
            conn: connection::open_in_memory()?,
            options: StoreOptions::default(),
        })
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    // --- songs ---

    /// Add a catalog result to the library. Reports
    /// [`AddOutcome::Duplicate`] when the song is already there.
    pub fn add_song(&self, song: &Song) -> Result<AddOutcome> {
        songs::add_song(&self.conn, song).context("add song")
    }

    /// The whole repertoire, newest first. Empty on store failure.
    pub fn songs(&self) -> Vec<Song> {
        songs::fetch_all_songs(&self.conn).unwrap_or_else(|err| {
            warn!("failed to load songs: {err:#}");
            Vec::new()
        })
    }

    pub fn song(&self, id: &str) -> Option<Song> {
        songs::fetch_song(&self.conn, id).unwrap_or_else(|err| {
            warn!("failed to load song {id}: {err:#}");
            None
        })
    }

    /// Move the progress slider, deriving the status transition the new value
    /// implies. Returns the status the song ended up with.
    pub fn set_progress(&self, id: &str, progress: u8) -> Result<SongStatus> {
        let song = songs::fetch_song(&self.conn, id)
            .context("set progress")?
            .ok_or_else(|| anyhow!("no song with id {id}"))?;

        let status = song.status.after_progress(progress);
        songs::update_progress(&self.conn, id, progress, status).context("set progress")?;
        Ok(status)
    }

    /// Raw progress/status overwrite for callers that computed the transition
    /// themselves.
    pub fn update_progress(&self, id: &str, progress: u8, status: SongStatus) -> Result<()> {
        songs::update_progress(&self.conn, id, progress, status).context("update progress")
    }

    pub fn set_notes(&self, id: &str, notes: &str) -> Result<()> {
        songs::update_notes(&self.conn, id, notes).context("set notes")
    }

    pub fn set_instrument(&self, id: &str, instrument: Instrument) -> Result<()> {
        songs::update_instrument(&self.conn, id, instrument).context("set instrument")
    }

    /// Delete a song and, via the schema's cascades, everything it owns.
    pub fn remove_song(&self, id: &str) -> Result<()> {
        songs::delete_song(&self.conn, id).context("remove song")
    }

    // --- setlists ---

    pub fn create_setlist(&self, name: &str) -> Result<Setlist> {
        setlists::create_setlist(&self.conn, name).context("create setlist")
    }

    pub fn setlists(&self) -> Vec<Setlist> {
        setlists::fetch_setlists(&self.conn).unwrap_or_else(|err| {
            warn!("failed to load setlists: {err:#}");
            Vec::new()
        })
    }

    pub fn remove_setlist(&self, id: &str) -> Result<()> {
        setlists::delete_setlist(&self.conn, id).context("remove setlist")
    }

    pub fn add_song_to_setlist(&self, setlist_id: &str, song_id: &str) -> Result<AddOutcome> {
        setlists::add_song_to_setlist(
            &self.conn,
            setlist_id,
            song_id,
            self.options.allow_duplicate_setlist_entries,
        )
        .context("add song to setlist")
    }

    pub fn remove_song_from_setlist(&self, setlist_id: &str, song_id: &str) -> Result<()> {
        setlists::remove_song_from_setlist(&self.conn, setlist_id, song_id)
            .context("remove song from setlist")
    }

    /// Songs in a setlist in insertion order. Empty on store failure.
    pub fn setlist_songs(&self, setlist_id: &str) -> Vec<Song> {
        setlists::fetch_setlist_songs(&self.conn, setlist_id).unwrap_or_else(|err| {
            warn!("failed to load setlist {setlist_id}: {err:#}");
            Vec::new()
        })
    }

    // --- practice ---

    /// Log a practice block that just finished.
    pub fn log_practice(&self, song_id: &str, duration_seconds: i64) -> Result<PracticeSession> {
        sessions::log_session(
            &self.conn,
            song_id,
            duration_seconds,
            Utc::now().timestamp_millis(),
        )
        .context("log practice session")
    }

    pub fn song_sessions(&self, song_id: &str) -> Vec<PracticeSession> {
        sessions::fetch_song_sessions(&self.conn, song_id).unwrap_or_else(|err| {
            warn!("failed to load sessions for {song_id}: {err:#}");
            Vec::new()
        })
    }

    /// Weekly chart and current streak. Neutral zeros on store failure so the
    /// dashboard still renders.
    pub fn practice_stats(&self) -> PracticeStats {
        stats::practice_stats(&self.conn).unwrap_or_else(|err| {
            warn!("failed to compute practice stats: {err:#}");
            PracticeStats::default()
        })
    }

    /// One song worth practicing right now, or `None` on an empty library.
    pub fn suggestion(&self) -> Option<Song> {
        suggest::suggestion(&self.conn).unwrap_or_else(|err| {
            warn!("failed to pick a suggestion: {err:#}");
            None
        })
    }

    // --- memos ---

    pub fn record_memo(&self, song_id: &str, uri: &str, duration: i64) -> Result<AudioMemo> {
        memos::add_memo(&self.conn, song_id, uri, duration).context("record memo")
    }

    pub fn song_memos(&self, song_id: &str) -> Vec<AudioMemo> {
        memos::fetch_song_memos(&self.conn, song_id).unwrap_or_else(|err| {
            warn!("failed to load memos for {song_id}: {err:#}");
            Vec::new()
        })
    }

    pub fn remove_memo(&self, id: &str) -> Result<()> {
        memos::delete_memo(&self.conn, id).context("remove memo")
    }

    // --- backup ---

    pub fn export_snapshot(&self) -> Result<Snapshot> {
        backup::export_snapshot(&self.conn).context("export snapshot")
    }

    pub fn export_json(&self) -> Result<String> {
        backup::to_json(&self.export_snapshot()?)
    }

    pub fn import_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        backup::import_snapshot(&mut self.conn, snapshot).context("import snapshot")
    }

    /// Parse and merge a backup document. Malformed documents are rejected
    /// before any write happens.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let snapshot = backup::parse_snapshot(json)?;
        self.import_snapshot(&snapshot)
    }

    /// Escape hatch for derived queries not worth a dedicated method.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// Keep the public surface honest about what the handle is for.
impl std::fmt::Debug for Repertoire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repertoire")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util;

    #[test]
    fn set_progress_applies_the_transition_rule() {
        let repo = Repertoire::open_in_memory().unwrap();
        repo.add_song(&test_util::song("a")).unwrap();

        assert_eq!(repo.set_progress("a", 10).unwrap(), SongStatus::Learning);
        assert_eq!(repo.set_progress("a", 100).unwrap(), SongStatus::Learned);
        assert_eq!(repo.set_progress("a", 50).unwrap(), SongStatus::Learning);

        let song = repo.song("a").unwrap();
        assert_eq!(song.progress, 50);
        assert_eq!(song.status, SongStatus::Learning);
    }

    #[test]
    fn set_progress_on_a_missing_song_is_an_error() {
        let repo = Repertoire::open_in_memory().unwrap();
        assert!(repo.set_progress("ghost", 10).is_err());
    }

    #[test]
    fn setlist_duplicates_follow_the_configured_policy() {
        let strict = Repertoire::open_in_memory().unwrap();
        strict.add_song(&test_util::song("a")).unwrap();
        let setlist = strict.create_setlist("Gig").unwrap();
        strict.add_song_to_setlist(&setlist.id, "a").unwrap();
        assert_eq!(
            strict.add_song_to_setlist(&setlist.id, "a").unwrap(),
            AddOutcome::Duplicate
        );

        let lax = Repertoire::open_in_memory().unwrap().with_options(StoreOptions {
            allow_duplicate_setlist_entries: true,
        });
        lax.add_song(&test_util::song("a")).unwrap();
        let setlist = lax.create_setlist("Gig").unwrap();
        lax.add_song_to_setlist(&setlist.id, "a").unwrap();
        lax.add_song_to_setlist(&setlist.id, "a").unwrap();
        assert_eq!(lax.setlist_songs(&setlist.id).len(), 2);
    }

    #[test]
    fn import_json_rejects_foreign_documents() {
        let mut repo = Repertoire::open_in_memory().unwrap();
        assert!(repo.import_json(r#"{"hello": "world"}"#).is_err());
        assert!(repo.songs().is_empty());
    }

    #[test]
    fn export_import_round_trip_through_json() {
        let source = Repertoire::open_in_memory().unwrap();
        source.add_song(&test_util::song("a")).unwrap();
        let setlist = source.create_setlist("Gig").unwrap();
        source.add_song_to_setlist(&setlist.id, "a").unwrap();
        let json = source.export_json().unwrap();

        let mut target = Repertoire::open_in_memory().unwrap();
        target.import_json(&json).unwrap();

        assert_eq!(target.songs(), source.songs());
        assert_eq!(target.setlists(), source.setlists());
    }

    #[test]
    fn practice_flow_feeds_history() {
        let repo = Repertoire::open_in_memory().unwrap();
        repo.add_song(&test_util::song("a")).unwrap();

        repo.log_practice("a", 300).unwrap();
        repo.log_practice("a", 120).unwrap();

        assert_eq!(repo.song_sessions("a").len(), 2);
        let stats = repo.practice_stats();
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.last_seven_days.len(), 7);
        assert!(stats.last_seven_days[6].minutes >= 7.0 - 1e-9);
    }
}
