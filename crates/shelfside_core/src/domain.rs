//! crates/shelfside_core/src/domain.rs
//!
//! Defines the pure, core data structures for the reader.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a book in the user's library, as far as the reader core is
/// concerned: identity plus the reading-progress fields this core mutates.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Discovered asynchronously after the first successful document load.
    pub total_pages: Option<u32>,
    pub last_page_read: u32,
    /// Always derived from `last_page_read` and `total_pages`, never stored
    /// independently of that relationship.
    pub reading_progress: u8,
    pub is_completed: bool,
}

/// One continuous reading interval for a (user, book) pair.
///
/// Created when a reader screen mounts, overwritten by heartbeats, closed by
/// the final update on unmount. Sessions are never merged.
#[derive(Debug, Clone)]
pub struct ReadingSession {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    /// `None` while the session is still active.
    pub end_time: Option<DateTime<Utc>>,
    /// `None` until the first heartbeat computes it.
    pub duration_minutes: Option<i64>,
    pub pages_read: u32,
}

/// Transient per-page visibility measurement, overwritten on every
/// viewport frame. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionRecord {
    pub page: u32,
    /// Visibility ratio in [0, 1]; 0 means not intersecting at all.
    pub ratio: f64,
    /// Vertical offset of the page's top edge relative to the viewport.
    pub top: f64,
}

/// Aggregated reading statistics for one user, derived on demand from the
/// full session history.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingStats {
    pub minutes_today: i64,
    pub pages_today: i64,
    pub minutes_last_7_days: i64,
    pub pages_last_7_days: i64,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    /// Percentage of the weekly reading goal reached, capped at 100.
    pub weekly_goal_percent: u8,
}

/// Totals for one calendar year of reading activity.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSummary {
    pub year: i32,
    pub total_minutes: i64,
    pub total_pages: i64,
    pub active_days: u32,
    /// Average over the days of the year that have actually elapsed, so an
    /// in-progress year is not diluted by future zero-activity days.
    pub avg_minutes_per_day: f64,
}
