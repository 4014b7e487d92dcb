//! crates/shelfside_core/src/tracker.rs
//!
//! Reading-session lifecycle and accrual.
//!
//! One tracker owns one remote session record for exactly the lifetime of a
//! reader screen. Heartbeats recompute duration and pages from absolute
//! start values, so repeated updates are idempotent overwrites rather than
//! additive increments, and a redundant final write at teardown is harmless.
//! Every store failure is logged and swallowed: progress tracking is
//! best-effort telemetry, never allowed to interrupt reading.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ReadingSession;
use crate::ports::ProgressStore;

/// How often an active session pushes an accrual update.
pub const HEARTBEAT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

/// Reading progress at or above this percentage marks the book completed.
pub const COMPLETION_THRESHOLD_PERCENT: u8 = 98;

/// Whole minutes elapsed, rounded, never less than 1: a session always
/// reports at least a minute so aggregates see no zero-duration noise.
pub fn duration_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (now - start).num_milliseconds();
    ((ms as f64 / 60_000.0).round() as i64).max(1)
}

/// Pages credited for a session, direction-agnostic, never less than 1.
pub fn pages_traversed(start_page: u32, current_page: u32) -> u32 {
    start_page.abs_diff(current_page).max(1)
}

/// Percentage of the book read, derived from the last page and the total.
pub fn reading_progress(last_page_read: u32, total_pages: u32) -> u8 {
    if total_pages == 0 {
        return 0;
    }
    let pct = (last_page_read as f64 / total_pages as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

pub fn is_completed(progress: u8) -> bool {
    progress >= COMPLETION_THRESHOLD_PERCENT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    NotStarted,
    Active,
    Ended,
}

pub struct SessionTracker {
    store: Arc<dyn ProgressStore>,
    state: TrackerState,
    session_id: Uuid,
    /// False when the create call failed; later updates are skipped since
    /// there is no row to overwrite.
    recorded: bool,
    user_id: Uuid,
    book_id: Uuid,
    start_time: DateTime<Utc>,
    start_page: u32,
    current_page: u32,
}

impl SessionTracker {
    pub fn new(store: Arc<dyn ProgressStore>, user_id: Uuid, book_id: Uuid) -> Self {
        Self {
            store,
            state: TrackerState::NotStarted,
            session_id: Uuid::new_v4(),
            recorded: false,
            user_id,
            book_id,
            start_time: Utc::now(),
            start_page: 1,
            current_page: 1,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// `NotStarted -> Active`: captures the wall-clock start and the page
    /// the user opened on, and creates the remote record.
    pub async fn start(&mut self, start_page: u32, now: DateTime<Utc>) {
        if self.state != TrackerState::NotStarted {
            return;
        }
        self.state = TrackerState::Active;
        self.start_time = now;
        self.start_page = start_page.max(1);
        self.current_page = self.start_page;

        let session = ReadingSession {
            id: self.session_id,
            book_id: self.book_id,
            user_id: self.user_id,
            start_time: now,
            end_time: None,
            duration_minutes: None,
            pages_read: 1,
        };
        match self.store.create_session(&session).await {
            Ok(()) => self.recorded = true,
            Err(e) => warn!(session_id = %self.session_id, "failed to create reading session: {e}"),
        }
    }

    /// The observer reported a new current page.
    pub fn page_changed(&mut self, page: u32) {
        if self.state == TrackerState::Active {
            self.current_page = page;
        }
    }

    /// `Active -> Active`: periodic timer tick or a visibility-hidden
    /// event. Both recompute and overwrite the same record.
    pub async fn heartbeat(&mut self, now: DateTime<Utc>) {
        if self.state != TrackerState::Active {
            return;
        }
        self.push_update(now).await;
    }

    /// `Active -> Ended`: the final update on unmount or unload. Terminal;
    /// later calls are no-ops.
    pub async fn end(&mut self, now: DateTime<Utc>) {
        if self.state != TrackerState::Active {
            self.state = TrackerState::Ended;
            return;
        }
        self.push_update(now).await;
        self.state = TrackerState::Ended;
    }

    async fn push_update(&self, now: DateTime<Utc>) {
        if !self.recorded {
            return;
        }
        let minutes = duration_minutes(self.start_time, now);
        let pages = pages_traversed(self.start_page, self.current_page);
        if let Err(e) = self
            .store
            .update_session(self.session_id, now, minutes, pages)
            .await
        {
            warn!(session_id = %self.session_id, "failed to update reading session: {e}");
        }
    }
}
