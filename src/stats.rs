//! Derived practice analytics: the weekly minutes chart and the consecutive
//! day streak. Both are computed by scanning small in-memory result sets;
//! session volume is bounded by how often a single person can practice, so a
//! grouped aggregate query would buy nothing.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone};
use rusqlite::Connection;

use crate::db::sessions;
use crate::models::PracticeSession;

/// One calendar day of the weekly chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    /// Short weekday name, e.g. "Mon".
    pub label: String,
    /// Total practiced minutes that day; fractional, never rounded.
    pub minutes: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PracticeStats {
    /// Seven buckets, oldest to newest, ending on today.
    pub last_seven_days: Vec<DayBucket>,
    /// Trailing consecutive practiced days ending no later than today.
    pub current_streak: u32,
}

/// Compute the weekly chart and streak from the store, anchored on the local
/// calendar day the call is made.
pub fn practice_stats(conn: &Connection) -> Result<PracticeStats> {
    let today = Local::now().date_naive();

    let window_start = today - Days::new(6);
    let since = local_day_start_ms(window_start).unwrap_or(i64::MIN);
    let recent = sessions::fetch_sessions_since(conn, since)?;

    let practiced: HashSet<NaiveDate> = sessions::fetch_distinct_session_dates(conn)?
        .into_iter()
        .filter_map(local_day)
        .collect();

    Ok(PracticeStats {
        last_seven_days: weekly_buckets(&recent, today),
        current_streak: current_streak(&practiced, today),
    })
}

/// Bucket sessions into the seven local calendar days ending on `today`.
/// A session belongs to the midnight-to-midnight day containing its end
/// timestamp.
fn weekly_buckets(sessions: &[PracticeSession], today: NaiveDate) -> Vec<DayBucket> {
    let mut buckets = Vec::with_capacity(7);
    for offset in (0..7u64).rev() {
        let day = today - Days::new(offset);
        let seconds: i64 = sessions
            .iter()
            .filter(|session| local_day(session.date) == Some(day))
            .map(|session| session.duration_seconds)
            .sum();
        buckets.push(DayBucket {
            label: day.format("%a").to_string(),
            minutes: seconds as f64 / 60.0,
        });
    }
    buckets
}

/// Walk backward from `today`, counting days with at least one session and
/// stopping at the first gap. Today itself only counts when practiced, but a
/// quiet today does not break a streak that ended yesterday.
fn current_streak(practiced: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    if practiced.contains(&today) {
        streak += 1;
    }

    let mut day = today;
    loop {
        day = match day.pred_opt() {
            Some(previous) => previous,
            None => break,
        };
        if practiced.contains(&day) {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Local calendar day containing an epoch-milliseconds instant.
fn local_day(ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ms).map(|instant| instant.with_timezone(&Local).date_naive())
}

/// Epoch milliseconds of local midnight starting `day`. `earliest` resolves
/// the ambiguous case where a DST transition lands on midnight.
fn local_day_start_ms(day: NaiveDate) -> Option<i64> {
    Local
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|instant| instant.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connection, songs, test_util};

    /// A timestamp comfortably inside `day` in local time.
    fn at_noon(day: NaiveDate) -> i64 {
        local_day_start_ms(day).unwrap() + 12 * 60 * 60 * 1000
    }

    fn session(date_ms: i64, duration_seconds: i64) -> PracticeSession {
        PracticeSession {
            id: "test".into(),
            song_id: "a".into(),
            duration_seconds,
            date: date_ms,
        }
    }

    #[test]
    fn streak_counts_trailing_consecutive_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let practiced: HashSet<NaiveDate> = [0u64, 1, 2]
            .into_iter()
            .map(|back| today - Days::new(back))
            .collect();
        assert_eq!(current_streak(&practiced, today), 3);
    }

    #[test]
    fn gap_before_today_means_zero() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let practiced: HashSet<NaiveDate> = [today - Days::new(2)].into_iter().collect();
        assert_eq!(current_streak(&practiced, today), 0);
    }

    #[test]
    fn quiet_today_does_not_break_yesterdays_streak() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let practiced: HashSet<NaiveDate> = [1u64, 2]
            .into_iter()
            .map(|back| today - Days::new(back))
            .collect();
        assert_eq!(current_streak(&practiced, today), 2);
    }

    #[test]
    fn empty_week_has_seven_zero_buckets_with_correct_labels() {
        // 2000-01-01 was a Saturday, so the week ending Friday the 7th reads
        // Sat through Fri.
        let today = NaiveDate::from_ymd_opt(2000, 1, 7).unwrap();
        let buckets = weekly_buckets(&[], today);

        assert_eq!(buckets.len(), 7);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"]);
        assert!(buckets.iter().all(|b| b.minutes == 0.0));
    }

    #[test]
    fn sessions_sum_into_fractional_minutes_per_day() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let yesterday = today - Days::new(1);
        let sessions = vec![
            session(at_noon(today), 90),
            session(at_noon(today), 30),
            session(at_noon(yesterday), 45),
        ];

        let buckets = weekly_buckets(&sessions, today);
        assert_eq!(buckets[6].minutes, 2.0);
        assert_eq!(buckets[5].minutes, 0.75);
    }

    #[test]
    fn sessions_outside_the_window_are_ignored() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let sessions = vec![session(at_noon(today - Days::new(8)), 600)];

        let buckets = weekly_buckets(&sessions, today);
        assert!(buckets.iter().all(|b| b.minutes == 0.0));
    }

    #[test]
    fn stats_read_through_the_store() {
        let conn = connection::open_in_memory().unwrap();
        songs::add_song(&conn, &test_util::song("a")).unwrap();

        let today = Local::now().date_naive();
        crate::db::sessions::log_session(&conn, "a", 120, at_noon(today)).unwrap();
        crate::db::sessions::log_session(&conn, "a", 60, at_noon(today - Days::new(1))).unwrap();

        let stats = practice_stats(&conn).unwrap();
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.last_seven_days[6].minutes, 2.0);
        assert_eq!(stats.last_seven_days[5].minutes, 1.0);
    }
}
