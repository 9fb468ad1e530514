//! Picks one song to surface on the home screen. Prioritized fallback:
//! something mid-learning beats the wishlist, and the wishlist beats an
//! arbitrary library pick. Selection is memoryless on purpose; suggesting
//! the same song twice in a row is fine.

use anyhow::Result;
use rand::seq::IndexedRandom;
use rusqlite::Connection;

use crate::db::songs;
use crate::models::{Song, SongStatus};

/// Uniformly random pick from the first non-empty tier: Learning, then
/// WantToLearn, then the whole library. `None` only when the library is
/// empty.
pub fn suggestion(conn: &Connection) -> Result<Option<Song>> {
    for status in [SongStatus::Learning, SongStatus::WantToLearn] {
        let pool = songs::fetch_songs_with_status(conn, status)?;
        if let Some(song) = pool.choose(&mut rand::rng()) {
            return Ok(Some(song.clone()));
        }
    }

    // Nothing in flight and nothing queued up; let the store pick.
    songs::fetch_random_song(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connection, test_util};

    #[test]
    fn empty_library_yields_nothing() {
        let conn = connection::open_in_memory().unwrap();
        assert!(suggestion(&conn).unwrap().is_none());
    }

    #[test]
    fn learning_songs_always_win() {
        let conn = connection::open_in_memory().unwrap();
        songs::add_song(
            &conn,
            &test_util::song_with_status("learning", SongStatus::Learning),
        )
        .unwrap();
        for id in ["wish-1", "wish-2"] {
            songs::add_song(
                &conn,
                &test_util::song_with_status(id, SongStatus::WantToLearn),
            )
            .unwrap();
        }
        songs::add_song(
            &conn,
            &test_util::song_with_status("done", SongStatus::Learned),
        )
        .unwrap();

        for _ in 0..25 {
            let pick = suggestion(&conn).unwrap().unwrap();
            assert_eq!(pick.id, "learning");
        }
    }

    #[test]
    fn wishlist_is_the_fallback_tier() {
        let conn = connection::open_in_memory().unwrap();
        songs::add_song(
            &conn,
            &test_util::song_with_status("wish", SongStatus::WantToLearn),
        )
        .unwrap();
        songs::add_song(
            &conn,
            &test_util::song_with_status("done", SongStatus::Learned),
        )
        .unwrap();

        for _ in 0..25 {
            let pick = suggestion(&conn).unwrap().unwrap();
            assert_eq!(pick.id, "wish");
        }
    }

    #[test]
    fn learned_only_library_still_suggests_something() {
        let conn = connection::open_in_memory().unwrap();
        songs::add_song(
            &conn,
            &test_util::song_with_status("done", SongStatus::Learned),
        )
        .unwrap();

        let pick = suggestion(&conn).unwrap().unwrap();
        assert_eq!(pick.id, "done");
    }
}
