use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::BaseDirs;
use rusqlite::Connection;
use tracing::debug;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".repertoire";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "repertoire.sqlite";

/// Schema version the code expects. Bump this together with a new `migrate_vN`
/// step; `migrate` walks the store forward one version at a time.
const SCHEMA_VERSION: i64 = 3;

/// Open the database at `path`, creating the file and any parent directories
/// on first use, and bring the schema up to [`SCHEMA_VERSION`]. Safe to call
/// on every process start: a store that is already current passes straight
/// through the version checks.
///
/// WAL journaling is enabled so a foreground list refresh never blocks on an
/// in-flight write, and `PRAGMA foreign_keys = ON` makes the CASCADE rules in
/// the schema behave the same during tests and production runs.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    configure(&conn)?;
    migrate(&conn)?;
    Ok(conn)
}

/// Open the database at the default per-user location.
pub fn open_default() -> Result<Connection> {
    open(&default_db_path()?)
}

/// Fully migrated in-memory store, used by tests and throwaway tooling.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    configure(&conn)?;
    migrate(&conn)?;
    Ok(conn)
}

/// Resolve the absolute path to the SQLite database inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("failed to enable WAL journaling")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous mode")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    Ok(())
}

/// Walk the store forward from whatever `PRAGMA user_version` reports to the
/// current schema. Each step runs at most once per database, which replaces
/// the older "try the ALTER and swallow the duplicate-column error" approach
/// with an explicit version check.
fn migrate(conn: &Connection) -> Result<()> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read schema version")?;

    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    debug!(from = version, to = SCHEMA_VERSION, "migrating schema");

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }
    if version < 3 {
        migrate_v3(conn)?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .context("failed to record schema version")?;
    Ok(())
}

/// V1: base tables. Song is the root entity; every other table hangs off it
/// (or off setlists) with ON DELETE CASCADE, so deleting a song sweeps its
/// memberships, practice history, and memos without application-level cleanup.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS songs (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            albumArt TEXT NOT NULL,
            status TEXT NOT NULL,
            progress INTEGER NOT NULL,
            addedAt INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS setlists (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            createdAt INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS setlist_items (
            id TEXT PRIMARY KEY NOT NULL,
            setlistId TEXT NOT NULL,
            songId TEXT NOT NULL,
            songOrder INTEGER NOT NULL,
            FOREIGN KEY (setlistId) REFERENCES setlists (id) ON DELETE CASCADE,
            FOREIGN KEY (songId) REFERENCES songs (id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_setlist_items_setlist ON setlist_items (setlistId);
        CREATE INDEX IF NOT EXISTS idx_setlist_items_song ON setlist_items (songId);

        CREATE TABLE IF NOT EXISTS practice_sessions (
            id TEXT PRIMARY KEY NOT NULL,
            songId TEXT NOT NULL,
            durationSeconds INTEGER NOT NULL,
            date INTEGER NOT NULL,
            FOREIGN KEY (songId) REFERENCES songs (id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_practice_sessions_song ON practice_sessions (songId);

        CREATE TABLE IF NOT EXISTS audio_memos (
            id TEXT PRIMARY KEY NOT NULL,
            songId TEXT NOT NULL,
            uri TEXT NOT NULL,
            createdAt TEXT NOT NULL,
            duration INTEGER NOT NULL,
            FOREIGN KEY (songId) REFERENCES songs (id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_audio_memos_song ON audio_memos (songId);

        COMMIT;",
    )
    .context("failed to create base schema")
}

/// V2: per-song instrument tag.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute("ALTER TABLE songs ADD COLUMN instrument TEXT", [])
        .context("failed to add instrument column")?;
    Ok(())
}

/// V3: free-text practice notes.
fn migrate_v3(conn: &Connection) -> Result<()> {
    conn.execute("ALTER TABLE songs ADD COLUMN notes TEXT", [])
        .context("failed to add notes column")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_lands_on_current_version() {
        let conn = open_in_memory().unwrap();
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn migration_is_idempotent() {
        let conn = open_in_memory().unwrap();
        // A second pass over an already-current store must not touch anything.
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
    }

    #[test]
    fn v1_store_gains_missing_columns() {
        let conn = Connection::open_in_memory().unwrap();
        configure(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        migrate(&conn).unwrap();

        let columns: Vec<String> = {
            let mut stmt = conn.prepare("PRAGMA table_info(songs)").unwrap();
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
            names
        };
        assert!(columns.iter().any(|c| c == "instrument"));
        assert!(columns.iter().any(|c| c == "notes"));
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = open_in_memory().unwrap();
        let result = conn.execute(
            "INSERT INTO practice_sessions (id, songId, durationSeconds, date)
             VALUES ('s1', 'missing-song', 60, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
