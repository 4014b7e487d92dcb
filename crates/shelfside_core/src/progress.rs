//! crates/shelfside_core/src/progress.rs
//!
//! Streaks and time-bucketed statistics, derived on demand from the full
//! session history. Nothing here is incrementally maintained; statistics
//! views recompute from scratch each time they are shown.
//!
//! Streak rules are deliberately asymmetric: the current streak treats
//! "yesterday" as still alive (a user isn't punished before their day is
//! over), while the longest streak looks only at adjacent-day gaps. Do not
//! unify them.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc};

use crate::domain::{ReadingSession, ReadingStats, YearSummary};

/// Distinct active days needed in a rolling week to hit the reading goal.
pub const WEEKLY_GOAL_DAYS: u32 = 5;

/// Derives streaks and totals from session history, bucketing by calendar
/// days in the reader's own time zone.
pub struct ProgressAggregator {
    tz: FixedOffset,
}

impl ProgressAggregator {
    pub fn new(tz: FixedOffset) -> Self {
        Self { tz }
    }

    /// Builds from a UTC offset in minutes (what a browser client reports),
    /// falling back to UTC for out-of-range values.
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let tz = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { tz }
    }

    fn local_date(&self, t: DateTime<Utc>) -> NaiveDate {
        t.with_timezone(&self.tz).date_naive()
    }

    /// Distinct calendar dates with at least one session start, sorted
    /// descending for streak walking.
    pub fn active_dates(&self, sessions: &[ReadingSession]) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = sessions
            .iter()
            .map(|s| self.local_date(s.start_time))
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        dates
    }

    /// Consecutive active days ending at today or yesterday; 0 once the
    /// most recent activity is older than yesterday.
    pub fn current_streak(&self, sessions: &[ReadingSession], today: NaiveDate) -> u32 {
        let dates = self.active_dates(sessions);
        let Some(&newest) = dates.first() else {
            return 0;
        };
        let still_alive =
            newest == today || today.pred_opt().is_some_and(|yesterday| newest == yesterday);
        if !still_alive {
            return 0;
        }

        let mut streak = 1u32;
        for pair in dates.windows(2) {
            if (pair[0] - pair[1]).num_days() == 1 {
                streak += 1;
            } else {
                break;
            }
        }
        streak
    }

    /// Longest consecutive-day run anywhere in the history.
    pub fn longest_streak(&self, sessions: &[ReadingSession]) -> u32 {
        let dates = self.active_dates(sessions);
        if dates.is_empty() {
            return 0;
        }
        let mut longest = 1u32;
        let mut run = 1u32;
        for pair in dates.windows(2) {
            if (pair[0] - pair[1]).num_days() == 1 {
                run += 1;
            } else {
                run = 1;
            }
            longest = longest.max(run);
        }
        longest
    }

    /// The full statistics bundle for the stats and achievements views.
    pub fn stats(&self, sessions: &[ReadingSession], now: DateTime<Utc>) -> ReadingStats {
        let today = self.local_date(now);
        let week_start = now - Duration::days(7);

        let mut minutes_today = 0i64;
        let mut pages_today = 0i64;
        let mut minutes_week = 0i64;
        let mut pages_week = 0i64;
        let mut week_days: Vec<NaiveDate> = Vec::new();

        for session in sessions {
            if session.start_time > now {
                continue;
            }
            let minutes = session_minutes(session);
            let pages = i64::from(session.pages_read);
            if self.local_date(session.start_time) == today {
                minutes_today += minutes;
                pages_today += pages;
            }
            if session.start_time > week_start {
                minutes_week += minutes;
                pages_week += pages;
                week_days.push(self.local_date(session.start_time));
            }
        }

        week_days.sort_unstable();
        week_days.dedup();

        let current = self.current_streak(sessions, today);
        let longest = self.longest_streak(sessions).max(current);

        ReadingStats {
            minutes_today,
            pages_today,
            minutes_last_7_days: minutes_week,
            pages_last_7_days: pages_week,
            current_streak_days: current,
            longest_streak_days: longest,
            weekly_goal_percent: weekly_goal_percent(week_days.len() as u32),
        }
    }

    /// Totals for one named calendar year. For the year in progress the end
    /// boundary clips to `now`, so averages divide by elapsed days only.
    pub fn year_summary(
        &self,
        sessions: &[ReadingSession],
        year: i32,
        now: DateTime<Utc>,
    ) -> YearSummary {
        let today = self.local_date(now);

        let mut total_minutes = 0i64;
        let mut total_pages = 0i64;
        let mut days: Vec<NaiveDate> = Vec::new();

        for session in sessions {
            if session.start_time > now {
                continue;
            }
            let date = self.local_date(session.start_time);
            if date.year() != year {
                continue;
            }
            total_minutes += session_minutes(session);
            total_pages += i64::from(session.pages_read);
            days.push(date);
        }

        days.sort_unstable();
        days.dedup();

        let elapsed_days = if year > today.year() {
            0
        } else if year == today.year() {
            today.ordinal()
        } else {
            NaiveDate::from_ymd_opt(year, 12, 31).map_or(365, |d| d.ordinal())
        };

        let avg_minutes_per_day = if elapsed_days == 0 {
            0.0
        } else {
            total_minutes as f64 / f64::from(elapsed_days)
        };

        YearSummary {
            year,
            total_minutes,
            total_pages,
            active_days: days.len() as u32,
            avg_minutes_per_day,
        }
    }
}

/// Weekly goal completion, capped at 100.
pub fn weekly_goal_percent(active_days_in_window: u32) -> u8 {
    let pct = (f64::from(active_days_in_window) / f64::from(WEEKLY_GOAL_DAYS) * 100.0).round();
    pct.min(100.0) as u8
}

/// A session's minutes, with a safe fallback chain: the stored
/// `duration_minutes` if present, else the span from start to end, else 0.
fn session_minutes(session: &ReadingSession) -> i64 {
    if let Some(minutes) = session.duration_minutes {
        return minutes;
    }
    match session.end_time {
        Some(end) => {
            let ms = (end - session.start_time).num_milliseconds();
            ((ms as f64 / 60_000.0).round() as i64).max(0)
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn utc() -> ProgressAggregator {
        ProgressAggregator::from_offset_minutes(0)
    }

    fn session_on(date: NaiveDate) -> ReadingSession {
        session_at(
            Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap()),
            Some(10),
            5,
        )
    }

    fn session_at(
        start: DateTime<Utc>,
        duration_minutes: Option<i64>,
        pages_read: u32,
    ) -> ReadingSession {
        ReadingSession {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_time: start,
            end_time: None,
            duration_minutes,
            pages_read,
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn streak_continues_through_a_consecutive_run_and_stops_at_the_gap() {
        let today = day("2026-08-31");
        let sessions: Vec<_> = [0i64, 1, 2, 5]
            .into_iter()
            .map(|back| session_on(today - Duration::days(back)))
            .collect();

        let agg = utc();
        assert_eq!(agg.current_streak(&sessions, today), 3);
        assert_eq!(agg.longest_streak(&sessions), 3);
    }

    #[test]
    fn yesterday_still_counts_when_today_has_no_activity() {
        let today = day("2026-08-31");
        let sessions: Vec<_> = [1i64, 2]
            .into_iter()
            .map(|back| session_on(today - Duration::days(back)))
            .collect();

        assert_eq!(utc().current_streak(&sessions, today), 2);
    }

    #[test]
    fn a_one_day_gap_breaks_the_streak() {
        let today = day("2026-08-31");
        let sessions = vec![
            session_on(today),
            session_on(today - Duration::days(2)),
        ];

        let agg = utc();
        assert_eq!(agg.current_streak(&sessions, today), 1);
        assert_eq!(agg.longest_streak(&sessions), 1);
    }

    #[test]
    fn activity_older_than_yesterday_means_no_current_streak() {
        let today = day("2026-08-31");
        let sessions: Vec<_> = [2i64, 3, 4]
            .into_iter()
            .map(|back| session_on(today - Duration::days(back)))
            .collect();

        let agg = utc();
        assert_eq!(agg.current_streak(&sessions, today), 0);
        // The old run still counts for the longest streak.
        assert_eq!(agg.longest_streak(&sessions), 3);
    }

    #[test]
    fn multiple_sessions_on_one_day_are_a_single_active_date() {
        let today = day("2026-08-31");
        let sessions = vec![session_on(today), session_on(today), session_on(today)];

        assert_eq!(utc().active_dates(&sessions), vec![today]);
        assert_eq!(utc().current_streak(&sessions, today), 1);
    }

    #[test]
    fn daily_and_weekly_sums_with_the_duration_fallback_chain() {
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 20, 0, 0).unwrap();

        let mut with_end = session_at(now - Duration::hours(3), None, 12);
        with_end.end_time = Some(with_end.start_time + Duration::minutes(25));

        let sessions = vec![
            // Today, stored duration.
            session_at(now - Duration::hours(1), Some(30), 8),
            // Today, duration missing: falls back to end - start.
            with_end,
            // Today, no end and no duration: contributes 0 minutes.
            session_at(now - Duration::hours(2), None, 3),
            // Four days ago: weekly only.
            session_at(now - Duration::days(4), Some(15), 20),
            // Ten days ago: outside both windows.
            session_at(now - Duration::days(10), Some(600), 99),
        ];

        let stats = utc().stats(&sessions, now);
        assert_eq!(stats.minutes_today, 55);
        assert_eq!(stats.pages_today, 23);
        assert_eq!(stats.minutes_last_7_days, 70);
        assert_eq!(stats.pages_last_7_days, 43);
    }

    #[test]
    fn weekly_goal_caps_at_one_hundred() {
        assert_eq!(weekly_goal_percent(0), 0);
        assert_eq!(weekly_goal_percent(2), 40);
        assert_eq!(weekly_goal_percent(5), 100);
        assert_eq!(weekly_goal_percent(7), 100);
    }

    #[test]
    fn goal_percent_reflects_distinct_active_days_in_the_window() {
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 20, 0, 0).unwrap();
        let sessions = vec![
            session_at(now - Duration::hours(1), Some(10), 1),
            session_at(now - Duration::hours(2), Some(10), 1),
            session_at(now - Duration::days(1), Some(10), 1),
            session_at(now - Duration::days(3), Some(10), 1),
        ];

        // Three distinct days out of five.
        assert_eq!(utc().stats(&sessions, now).weekly_goal_percent, 60);
    }

    #[test]
    fn an_in_progress_year_clips_its_end_boundary_to_now() {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
        let sessions = vec![
            session_at(now - Duration::days(1), Some(41), 10),
            session_at(now - Duration::days(5), Some(41), 10),
            // A session stamped in the future never counts.
            session_at(now + Duration::days(30), Some(999), 999),
        ];

        let summary = utc().year_summary(&sessions, 2026, now);
        assert_eq!(summary.total_minutes, 82);
        assert_eq!(summary.total_pages, 20);
        assert_eq!(summary.active_days, 2);
        // Feb 10 is day 41 of the year, so the average is exactly 2.
        assert!((summary.avg_minutes_per_day - 2.0).abs() < 1e-9);
    }

    #[test]
    fn a_completed_year_divides_by_its_full_length() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let sessions = vec![session_at(
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
            Some(730),
            50,
        )];

        let summary = utc().year_summary(&sessions, 2025, now);
        assert_eq!(summary.total_minutes, 730);
        assert!((summary.avg_minutes_per_day - 2.0).abs() < 1e-9);
    }

    #[test]
    fn the_time_zone_decides_which_day_a_session_belongs_to() {
        // 23:30 UTC on the 30th is already the 31st at UTC+2.
        let start = Utc.with_ymd_and_hms(2026, 8, 30, 23, 30, 0).unwrap();
        let sessions = vec![session_at(start, Some(10), 1)];

        let ahead = ProgressAggregator::from_offset_minutes(120);
        assert_eq!(ahead.active_dates(&sessions), vec![day("2026-08-31")]);
        assert_eq!(utc().active_dates(&sessions), vec![day("2026-08-30")]);
    }

    #[test]
    fn absurd_offsets_fall_back_to_utc() {
        let start = Utc.with_ymd_and_hms(2026, 8, 30, 23, 30, 0).unwrap();
        let sessions = vec![session_at(start, Some(10), 1)];

        // Past FixedOffset's range, and past what i32 seconds can hold.
        for minutes in [i32::MAX, i32::MIN, 100_000, -100_000] {
            let aggregator = ProgressAggregator::from_offset_minutes(minutes);
            assert_eq!(aggregator.active_dates(&sessions), vec![day("2026-08-30")]);
        }
    }
}
