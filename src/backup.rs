//! Portable backup of the whole store. Export dumps every table into one
//! versioned JSON document; import merges a document back in by identity, so
//! restoring on top of an existing library updates matching rows and inserts
//! the rest.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{memos, sessions, setlists, songs};
use crate::models::{AudioMemo, PracticeSession, Setlist, SetlistItem, Song};

/// Format version written into every export. Bump only on incompatible
/// changes to the document layout.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors a caller should show to the user verbatim; anything else coming out
/// of this module is an internal store failure.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("not a repertoire backup: missing `{0}` field")]
    MissingField(&'static str),
    #[error("backup document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The backup document. Field names match the store's column names so the
/// file stays recognizable next to the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// ISO-8601 export time, informational only.
    pub timestamp: String,
    pub songs: Vec<Song>,
    #[serde(default)]
    pub setlists: Vec<Setlist>,
    #[serde(rename = "setlistItems", default)]
    pub setlist_items: Vec<SetlistItem>,
    #[serde(rename = "practiceSessions", default)]
    pub practice_sessions: Vec<PracticeSession>,
    #[serde(rename = "audioMemos", default)]
    pub audio_memos: Vec<AudioMemo>,
}

/// Dump the full, unfiltered contents of every entity table.
pub fn export_snapshot(conn: &Connection) -> Result<Snapshot> {
    Ok(Snapshot {
        version: SNAPSHOT_VERSION,
        timestamp: Utc::now().to_rfc3339(),
        songs: songs::fetch_all_songs(conn)?,
        setlists: setlists::fetch_setlists(conn)?,
        setlist_items: setlists::fetch_all_setlist_items(conn)?,
        practice_sessions: sessions::fetch_all_sessions(conn)?,
        audio_memos: memos::fetch_all_memos(conn)?,
    })
}

/// Serialize a snapshot the way export files are written.
pub fn to_json(snapshot: &Snapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("failed to serialize snapshot")
}

/// Parse and validate a backup document. `version` and `songs` must be
/// present for the file to count as one of ours; the remaining arrays may be
/// absent (older exports did not always carry them) and default to empty.
pub fn parse_snapshot(json: &str) -> Result<Snapshot, BackupError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.get("version").is_none() {
        return Err(BackupError::MissingField("version"));
    }
    if value.get("songs").is_none() {
        return Err(BackupError::MissingField("songs"));
    }
    Ok(serde_json::from_value(value)?)
}

/// Merge a snapshot into the store: insert-or-replace by identity for songs,
/// setlists, and setlist items. Runs in a single transaction so a failure
/// partway through leaves the store exactly as it was.
///
/// Practice history and memo references are deliberately not merged; they
/// describe this device's sessions and locally stored recordings.
pub fn import_snapshot(conn: &mut Connection, snapshot: &Snapshot) -> Result<()> {
    let tx = conn
        .transaction()
        .context("failed to begin import transaction")?;

    {
        let mut insert_song = tx
            .prepare(
                "INSERT OR REPLACE INTO songs
                 (id, title, artist, albumArt, status, progress, notes, instrument, addedAt)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .context("failed to prepare song upsert")?;
        for song in &snapshot.songs {
            insert_song
                .execute(params![
                    song.id,
                    song.title,
                    song.artist,
                    song.album_art,
                    song.status,
                    song.progress,
                    song.notes,
                    song.instrument,
                    song.added_at,
                ])
                .context("failed to upsert song")?;
        }

        let mut insert_setlist = tx
            .prepare("INSERT OR REPLACE INTO setlists (id, name, createdAt) VALUES (?1, ?2, ?3)")
            .context("failed to prepare setlist upsert")?;
        for setlist in &snapshot.setlists {
            insert_setlist
                .execute(params![setlist.id, setlist.name, setlist.created_at])
                .context("failed to upsert setlist")?;
        }

        let mut insert_item = tx
            .prepare(
                "INSERT OR REPLACE INTO setlist_items (id, setlistId, songId, songOrder)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .context("failed to prepare setlist item upsert")?;
        for item in &snapshot.setlist_items {
            insert_item
                .execute(params![item.id, item.setlist_id, item.song_id, item.order])
                .context("failed to upsert setlist item")?;
        }
    }

    tx.commit().context("failed to commit import")
}
