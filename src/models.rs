//! Domain models that mirror the SQLite schema and the backup document.
//! The intent is that these types stay light-weight data holders so other
//! layers can focus on persistence and derived views. Serde renames keep the
//! JSON wire form identical to the column names, which is what makes backup
//! files portable across installs.

use rusqlite::{
    Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a song in the repertoire. Stored as text so the rows
/// stay readable when poking at the database directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SongStatus {
    WantToLearn,
    Learning,
    Learned,
}

impl SongStatus {
    /// The canonical text form used both in SQLite and in backup documents.
    pub fn as_str(self) -> &'static str {
        match self {
            SongStatus::WantToLearn => "WANT_TO_LEARN",
            SongStatus::Learning => "LEARNING",
            SongStatus::Learned => "LEARNED",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "WANT_TO_LEARN" => Some(SongStatus::WantToLearn),
            "LEARNING" => Some(SongStatus::Learning),
            "LEARNED" => Some(SongStatus::Learned),
            _ => None,
        }
    }

    /// Status implied by moving the progress slider to `progress`. This is a
    /// data-integrity rule, not presentation: reaching 100 always means
    /// Learned, dropping back below 100 demotes a Learned song to Learning,
    /// and any progress at all moves a WantToLearn song into Learning.
    pub fn after_progress(self, progress: u8) -> SongStatus {
        if progress == 100 {
            SongStatus::Learned
        } else if self == SongStatus::Learned {
            SongStatus::Learning
        } else if progress > 0 && self == SongStatus::WantToLearn {
            SongStatus::Learning
        } else {
            self
        }
    }
}

impl ToSql for SongStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SongStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        SongStatus::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

/// Which instrument the user practices a song on. Optional because songs
/// added before the column existed never had one assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instrument {
    Acoustic,
    Electric,
    Bass,
    Classical,
    Piano,
}

impl Instrument {
    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::Acoustic => "Acoustic",
            Instrument::Electric => "Electric",
            Instrument::Bass => "Bass",
            Instrument::Classical => "Classical",
            Instrument::Piano => "Piano",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Acoustic" => Some(Instrument::Acoustic),
            "Electric" => Some(Instrument::Electric),
            "Bass" => Some(Instrument::Bass),
            "Classical" => Some(Instrument::Classical),
            "Piano" => Some(Instrument::Piano),
            _ => None,
        }
    }
}

impl ToSql for Instrument {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Instrument {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Instrument::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

/// A song in the user's library. The id is the catalog track id handed to us
/// when the song was added, so re-adding the same search result is detectable
/// as a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Artwork URL kept verbatim from the catalog result.
    #[serde(rename = "albumArt")]
    pub album_art: String,
    pub status: SongStatus,
    /// Learning progress, 0 through 100.
    pub progress: u8,
    /// Free-text practice notes. Absent on rows created before the column
    /// was introduced.
    pub notes: Option<String>,
    pub instrument: Option<Instrument>,
    /// Epoch milliseconds when the song entered the library.
    #[serde(rename = "addedAt")]
    pub added_at: i64,
}

impl Song {
    /// Maps a row selected in canonical column order (see
    /// `db::songs::SONG_COLUMNS`) onto a `Song`.
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Song {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            album_art: row.get(3)?,
            status: row.get(4)?,
            progress: row.get(5)?,
            notes: row.get(6)?,
            instrument: row.get(7)?,
            added_at: row.get(8)?,
        })
    }
}

/// A user-named, ordered collection of songs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setlist {
    pub id: String,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

/// Membership row linking one song into one setlist. `order` is the
/// zero-based append position assigned at insertion time; there is no
/// reordering operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetlistItem {
    pub id: String,
    #[serde(rename = "setlistId")]
    pub setlist_id: String,
    #[serde(rename = "songId")]
    pub song_id: String,
    #[serde(rename = "songOrder")]
    pub order: i64,
}

/// One logged block of practice time. Immutable once created; rows only
/// disappear when the song they reference is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: String,
    #[serde(rename = "songId")]
    pub song_id: String,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: i64,
    /// Epoch milliseconds of the session end.
    pub date: i64,
}

/// Pointer to a recorded audio note. The actual audio lives outside the
/// store; we only keep the opaque uri the capture service handed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMemo {
    pub id: String,
    #[serde(rename = "songId")]
    pub song_id: String,
    pub uri: String,
    /// ISO-8601 creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Recording length in seconds.
    pub duration: i64,
}
