use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::db::AddOutcome;
use crate::models::{Instrument, Song, SongStatus};

/// Canonical column order shared by every song SELECT so
/// [`Song::from_row`] can map by index.
pub(crate) const SONG_COLUMNS: &str =
    "id, title, artist, albumArt, status, progress, notes, instrument, addedAt";

/// Insert a song into the library. Adding the same catalog id twice is an
/// expected user action (tapping the same search result again), so it reports
/// [`AddOutcome::Duplicate`] instead of failing.
pub fn add_song(conn: &Connection, song: &Song) -> Result<AddOutcome> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO songs
             (id, title, artist, albumArt, status, progress, notes, instrument, addedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                song.id,
                song.title,
                song.artist,
                song.album_art,
                song.status,
                song.progress,
                song.notes,
                song.instrument,
                song.added_at,
            ],
        )
        .context("failed to insert song")?;

    if inserted == 0 {
        Ok(AddOutcome::Duplicate)
    } else {
        Ok(AddOutcome::Added)
    }
}

/// Fetch the whole repertoire, newest additions first.
pub fn fetch_all_songs(conn: &Connection) -> Result<Vec<Song>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SONG_COLUMNS} FROM songs
             ORDER BY addedAt DESC, title COLLATE NOCASE"
        ))
        .context("failed to prepare songs query")?;

    let songs = stmt
        .query_map([], Song::from_row)
        .context("failed to iterate songs")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect songs")?;

    Ok(songs)
}

/// Look up a single song by its catalog id.
pub fn fetch_song(conn: &Connection, id: &str) -> Result<Option<Song>> {
    let song = conn
        .query_row(
            &format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?1"),
            [id],
            Song::from_row,
        )
        .optional()
        .context("failed to fetch song")?;

    Ok(song)
}

/// All songs currently in the given lifecycle stage. The suggestion picker
/// draws its tiers from this.
pub fn fetch_songs_with_status(conn: &Connection, status: SongStatus) -> Result<Vec<Song>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SONG_COLUMNS} FROM songs WHERE status = ?1"
        ))
        .context("failed to prepare status query")?;

    let songs = stmt
        .query_map([status], Song::from_row)
        .context("failed to iterate songs by status")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect songs by status")?;

    Ok(songs)
}

/// One song picked by the store itself, or `None` on an empty library.
pub fn fetch_random_song(conn: &Connection) -> Result<Option<Song>> {
    let song = conn
        .query_row(
            &format!("SELECT {SONG_COLUMNS} FROM songs ORDER BY RANDOM() LIMIT 1"),
            [],
            Song::from_row,
        )
        .optional()
        .context("failed to fetch random song")?;

    Ok(song)
}

/// Unconditional overwrite of progress and status. The status transition
/// implied by a progress change is the caller's job; see
/// [`SongStatus::after_progress`].
pub fn update_progress(
    conn: &Connection,
    id: &str,
    progress: u8,
    status: SongStatus,
) -> Result<()> {
    conn.execute(
        "UPDATE songs SET progress = ?1, status = ?2 WHERE id = ?3",
        params![progress, status, id],
    )
    .context("failed to update song progress")?;
    Ok(())
}

/// Overwrite the practice notes for a song.
pub fn update_notes(conn: &Connection, id: &str, notes: &str) -> Result<()> {
    conn.execute(
        "UPDATE songs SET notes = ?1 WHERE id = ?2",
        params![notes, id],
    )
    .context("failed to update song notes")?;
    Ok(())
}

/// Tag a song with the instrument it is practiced on.
pub fn update_instrument(conn: &Connection, id: &str, instrument: Instrument) -> Result<()> {
    conn.execute(
        "UPDATE songs SET instrument = ?1 WHERE id = ?2",
        params![instrument, id],
    )
    .context("failed to update song instrument")?;
    Ok(())
}

/// Remove a song. The schema cascades to setlist memberships, practice
/// sessions, and audio memos, so no application-level cleanup is needed.
/// Deleting a song that is already gone is not an error.
pub fn delete_song(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM songs WHERE id = ?1", params![id])
        .context("failed to delete song")?;
    Ok(())
}
