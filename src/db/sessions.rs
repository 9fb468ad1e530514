use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use crate::models::PracticeSession;

/// Record a finished practice block. `date_ms` is the session-end time in
/// epoch milliseconds; the caller supplies it so derived views can be tested
/// against pinned clocks.
pub fn log_session(
    conn: &Connection,
    song_id: &str,
    duration_seconds: i64,
    date_ms: i64,
) -> Result<PracticeSession> {
    let session = PracticeSession {
        id: Uuid::new_v4().to_string(),
        song_id: song_id.to_string(),
        duration_seconds,
        date: date_ms,
    };

    conn.execute(
        "INSERT INTO practice_sessions (id, songId, durationSeconds, date)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            session.id,
            session.song_id,
            session.duration_seconds,
            session.date
        ],
    )
    .context("failed to log practice session")?;

    Ok(session)
}

/// Practice history for one song, most recent first.
pub fn fetch_song_sessions(conn: &Connection, song_id: &str) -> Result<Vec<PracticeSession>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, songId, durationSeconds, date FROM practice_sessions
             WHERE songId = ?1 ORDER BY date DESC",
        )
        .context("failed to prepare song sessions query")?;

    let sessions = stmt
        .query_map([song_id], session_from_row)
        .context("failed to iterate song sessions")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect song sessions")?;

    Ok(sessions)
}

/// Sessions ending at or after `since_ms`, oldest first. Feeds the weekly
/// chart, which does its per-day bucketing in memory.
pub fn fetch_sessions_since(conn: &Connection, since_ms: i64) -> Result<Vec<PracticeSession>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, songId, durationSeconds, date FROM practice_sessions
             WHERE date >= ?1 ORDER BY date ASC",
        )
        .context("failed to prepare recent sessions query")?;

    let sessions = stmt
        .query_map([since_ms], session_from_row)
        .context("failed to iterate recent sessions")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect recent sessions")?;

    Ok(sessions)
}

/// Distinct session-end timestamps across all history, newest first. The
/// streak walk collapses these to calendar days.
pub fn fetch_distinct_session_dates(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT date FROM practice_sessions ORDER BY date DESC")
        .context("failed to prepare session dates query")?;

    let dates = stmt
        .query_map([], |row| row.get(0))
        .context("failed to iterate session dates")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect session dates")?;

    Ok(dates)
}

/// Full dump for the backup codec.
pub fn fetch_all_sessions(conn: &Connection) -> Result<Vec<PracticeSession>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, songId, durationSeconds, date FROM practice_sessions ORDER BY date ASC",
        )
        .context("failed to prepare all sessions query")?;

    let sessions = stmt
        .query_map([], session_from_row)
        .context("failed to iterate practice sessions")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect practice sessions")?;

    Ok(sessions)
}

fn session_from_row(row: &Row) -> rusqlite::Result<PracticeSession> {
    Ok(PracticeSession {
        id: row.get(0)?,
        song_id: row.get(1)?,
        duration_seconds: row.get(2)?,
        date: row.get(3)?,
    })
}
