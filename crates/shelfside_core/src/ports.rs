//! crates/shelfside_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the reader core.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the concrete database and of whatever is actually
//! rendering pages on the other side of the wire.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Book, ReadingSession};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The persistence collaborator: plain record reads and writes against the
/// books and reading-sessions tables. Progress writes are best-effort
/// telemetry; callers log and swallow failures rather than interrupting the
/// reading experience.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_book(&self, book_id: Uuid) -> PortResult<Book>;

    /// Records the page count discovered on the first successful document
    /// load. A book's total is set once and never overwritten.
    async fn set_total_pages(&self, book_id: Uuid, total_pages: u32) -> PortResult<()>;

    async fn save_reading_position(
        &self,
        book_id: Uuid,
        last_page_read: u32,
        reading_progress: u8,
        is_completed: bool,
    ) -> PortResult<()>;

    async fn create_session(&self, session: &ReadingSession) -> PortResult<()>;

    /// Upsert-style overwrite of an active session's accrual fields.
    /// Heartbeats and the final close both go through here.
    async fn update_session(
        &self,
        session_id: Uuid,
        end_time: DateTime<Utc>,
        duration_minutes: i64,
        pages_read: u32,
    ) -> PortResult<()>;

    async fn sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<ReadingSession>>;
}

/// The rendering collaborator: whatever lays out the document's pages and
/// can move the viewport. Page elements appear asynchronously, so geometry
/// queries may come back empty for a while after mount.
#[async_trait]
pub trait ViewportPort: Send + Sync {
    /// The absolute document offset of a page's top edge, or `None` while
    /// that page's element is not mounted yet.
    async fn page_top(&self, page: u32) -> PortResult<Option<f64>>;

    /// Moves the viewport to an absolute document offset.
    async fn scroll_to(&self, offset: f64, smooth: bool) -> PortResult<()>;

    /// Resolves once the viewport has reported `frames` further layout
    /// frames, letting a programmatic scroll settle before observation
    /// resumes.
    async fn settle(&self, frames: u32) -> PortResult<()>;
}
