use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use crate::models::AudioMemo;

/// Store a reference to a finished recording. The audio file itself lives
/// wherever the capture service put it; we only persist the uri.
pub fn add_memo(conn: &Connection, song_id: &str, uri: &str, duration: i64) -> Result<AudioMemo> {
    let memo = AudioMemo {
        id: Uuid::new_v4().to_string(),
        song_id: song_id.to_string(),
        uri: uri.to_string(),
        created_at: Utc::now().to_rfc3339(),
        duration,
    };

    conn.execute(
        "INSERT INTO audio_memos (id, songId, uri, createdAt, duration)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![memo.id, memo.song_id, memo.uri, memo.created_at, memo.duration],
    )
    .context("failed to insert audio memo")?;

    Ok(memo)
}

/// Memos attached to one song, newest recording first.
pub fn fetch_song_memos(conn: &Connection, song_id: &str) -> Result<Vec<AudioMemo>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, songId, uri, createdAt, duration FROM audio_memos
             WHERE songId = ?1 ORDER BY createdAt DESC",
        )
        .context("failed to prepare memo query")?;

    let memos = stmt
        .query_map([song_id], memo_from_row)
        .context("failed to iterate memos")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect memos")?;

    Ok(memos)
}

/// Delete a single memo row; absence of the target is not an error. Cleaning
/// up the referenced audio file is the caller's concern.
pub fn delete_memo(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM audio_memos WHERE id = ?1", params![id])
        .context("failed to delete audio memo")?;
    Ok(())
}

/// Full dump for the backup codec.
pub fn fetch_all_memos(conn: &Connection) -> Result<Vec<AudioMemo>> {
    let mut stmt = conn
        .prepare("SELECT id, songId, uri, createdAt, duration FROM audio_memos ORDER BY createdAt")
        .context("failed to prepare all memos query")?;

    let memos = stmt
        .query_map([], memo_from_row)
        .context("failed to iterate all memos")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect all memos")?;

    Ok(memos)
}

fn memo_from_row(row: &Row) -> rusqlite::Result<AudioMemo> {
    Ok(AudioMemo {
        id: row.get(0)?,
        song_id: row.get(1)?,
        uri: row.get(2)?,
        created_at: row.get(3)?,
        duration: row.get(4)?,
    })
}
