use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::db::AddOutcome;
use crate::db::songs::SONG_COLUMNS;
use crate::models::{Setlist, SetlistItem, Song};

/// Insert a new setlist, returning the hydrated struct so the caller can push
/// it straight into its own state without re-querying.
pub fn create_setlist(conn: &Connection, name: &str) -> Result<Setlist> {
    let setlist = Setlist {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        created_at: Utc::now().timestamp_millis(),
    };

    conn.execute(
        "INSERT INTO setlists (id, name, createdAt) VALUES (?1, ?2, ?3)",
        params![setlist.id, setlist.name, setlist.created_at],
    )
    .context("failed to insert setlist")?;

    Ok(setlist)
}

/// Every setlist, most recently created first.
pub fn fetch_setlists(conn: &Connection) -> Result<Vec<Setlist>> {
    let mut stmt = conn
        .prepare("SELECT id, name, createdAt FROM setlists ORDER BY createdAt DESC")
        .context("failed to prepare setlist query")?;

    let setlists = stmt
        .query_map([], |row| {
            Ok(Setlist {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })
        .context("failed to iterate setlists")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect setlists")?;

    Ok(setlists)
}

/// Remove a setlist. The schema cascades to its membership rows; absence of
/// the target is not an error.
pub fn delete_setlist(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM setlists WHERE id = ?1", params![id])
        .context("failed to delete setlist")?;
    Ok(())
}

/// Append a song to a setlist. The position is the current membership count,
/// so items stack in the order they were added and there is no reordering or
/// gap-filling later.
///
/// When `allow_duplicates` is false a (setlist, song) pair that already
/// exists reports [`AddOutcome::Duplicate`] and leaves the setlist untouched.
pub fn add_song_to_setlist(
    conn: &Connection,
    setlist_id: &str,
    song_id: &str,
    allow_duplicates: bool,
) -> Result<AddOutcome> {
    if !allow_duplicates {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM setlist_items WHERE setlistId = ?1 AND songId = ?2
                 )",
                params![setlist_id, song_id],
                |row| row.get(0),
            )
            .context("failed to check for existing membership")?;
        if exists {
            return Ok(AddOutcome::Duplicate);
        }
    }

    let order: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM setlist_items WHERE setlistId = ?1",
            params![setlist_id],
            |row| row.get(0),
        )
        .context("failed to count setlist items")?;

    conn.execute(
        "INSERT INTO setlist_items (id, setlistId, songId, songOrder)
         VALUES (?1, ?2, ?3, ?4)",
        params![Uuid::new_v4().to_string(), setlist_id, song_id, order],
    )
    .context("failed to link song to setlist")?;

    Ok(AddOutcome::Added)
}

/// Remove a song from a setlist. Clears every membership row for the pair, so
/// a song that was allowed in twice disappears entirely.
pub fn remove_song_from_setlist(conn: &Connection, setlist_id: &str, song_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM setlist_items WHERE setlistId = ?1 AND songId = ?2",
        params![setlist_id, song_id],
    )
    .context("failed to unlink song from setlist")?;
    Ok(())
}

/// Songs in a setlist, in the order they were added. The rowid tie-break
/// keeps insertion order stable even when a removal left two memberships with
/// the same append position.
pub fn fetch_setlist_songs(conn: &Connection, setlist_id: &str) -> Result<Vec<Song>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM songs s
             JOIN setlist_items si ON s.id = si.songId
             WHERE si.setlistId = ?1
             ORDER BY si.songOrder ASC, si.rowid ASC",
            prefixed_song_columns()
        ))
        .context("failed to prepare setlist songs query")?;

    let songs = stmt
        .query_map([setlist_id], Song::from_row)
        .context("failed to iterate setlist songs")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect setlist songs")?;

    Ok(songs)
}

/// Every membership row across all setlists, used by the backup codec.
pub fn fetch_all_setlist_items(conn: &Connection) -> Result<Vec<SetlistItem>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, setlistId, songId, songOrder FROM setlist_items
             ORDER BY setlistId, songOrder, rowid",
        )
        .context("failed to prepare setlist items query")?;

    let items = stmt
        .query_map([], |row| {
            Ok(SetlistItem {
                id: row.get(0)?,
                setlist_id: row.get(1)?,
                song_id: row.get(2)?,
                order: row.get(3)?,
            })
        })
        .context("failed to iterate setlist items")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect setlist items")?;

    Ok(items)
}

fn prefixed_song_columns() -> String {
    SONG_COLUMNS
        .split(", ")
        .map(|column| format!("s.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connection, songs, test_util};

    fn store_with_songs(ids: &[&str]) -> Connection {
        let conn = connection::open_in_memory().unwrap();
        for id in ids {
            songs::add_song(&conn, &test_util::song(id)).unwrap();
        }
        conn
    }

    #[test]
    fn songs_come_back_in_insertion_order() {
        let conn = store_with_songs(&["a", "b", "c"]);
        let setlist = create_setlist(&conn, "Open mic").unwrap();

        for id in ["b", "a", "c"] {
            add_song_to_setlist(&conn, &setlist.id, id, true).unwrap();
        }

        let ids: Vec<String> = fetch_setlist_songs(&conn, &setlist.id)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn insertion_order_survives_removal_gaps() {
        let conn = store_with_songs(&["a", "b", "c", "d"]);
        let setlist = create_setlist(&conn, "Gig").unwrap();

        for id in ["a", "b", "c"] {
            add_song_to_setlist(&conn, &setlist.id, id, true).unwrap();
        }
        // Removing "b" shrinks the count, so "d" gets the same append
        // position "c" already holds; it must still come back after "c".
        remove_song_from_setlist(&conn, &setlist.id, "b").unwrap();
        add_song_to_setlist(&conn, &setlist.id, "d", true).unwrap();

        let ids: Vec<String> = fetch_setlist_songs(&conn, &setlist.id)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["a", "c", "d"]);
    }

    #[test]
    fn duplicate_membership_is_rejected_by_default_policy() {
        let conn = store_with_songs(&["a"]);
        let setlist = create_setlist(&conn, "Gig").unwrap();

        assert_eq!(
            add_song_to_setlist(&conn, &setlist.id, "a", false).unwrap(),
            AddOutcome::Added
        );
        assert_eq!(
            add_song_to_setlist(&conn, &setlist.id, "a", false).unwrap(),
            AddOutcome::Duplicate
        );
        assert_eq!(fetch_setlist_songs(&conn, &setlist.id).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_membership_is_allowed_when_opted_in() {
        let conn = store_with_songs(&["a"]);
        let setlist = create_setlist(&conn, "Gig").unwrap();

        add_song_to_setlist(&conn, &setlist.id, "a", true).unwrap();
        add_song_to_setlist(&conn, &setlist.id, "a", true).unwrap();

        assert_eq!(fetch_setlist_songs(&conn, &setlist.id).unwrap().len(), 2);
    }

    #[test]
    fn deleting_a_setlist_cascades_memberships() {
        let conn = store_with_songs(&["a"]);
        let setlist = create_setlist(&conn, "Gig").unwrap();
        add_song_to_setlist(&conn, &setlist.id, "a", true).unwrap();

        delete_setlist(&conn, &setlist.id).unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM setlist_items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn linking_to_a_missing_song_is_a_constraint_error() {
        let conn = connection::open_in_memory().unwrap();
        let setlist = create_setlist(&conn, "Gig").unwrap();
        assert!(add_song_to_setlist(&conn, &setlist.id, "ghost", true).is_err());
    }
}
