//! services/reader/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `ProgressStore` port from the core crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shelfside_core::domain::{Book, ReadingSession};
use shelfside_core::ports::{PortError, PortResult, ProgressStore};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ProgressStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    total_pages: Option<i32>,
    last_page_read: i32,
    reading_progress: i32,
    is_completed: bool,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            total_pages: self.total_pages.map(|t| t.max(0) as u32),
            last_page_read: self.last_page_read.max(0) as u32,
            reading_progress: self.reading_progress.clamp(0, 100) as u8,
            is_completed: self.is_completed,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    book_id: Uuid,
    user_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,
    pages_read: i32,
}
impl SessionRecord {
    fn to_domain(self) -> ReadingSession {
        ReadingSession {
            id: self.id,
            book_id: self.book_id,
            user_id: self.user_id,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_minutes: self.duration_minutes,
            pages_read: self.pages_read.max(0) as u32,
        }
    }
}

//=========================================================================================
// `ProgressStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProgressStore for PgStore {
    async fn get_book(&self, book_id: Uuid) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "SELECT id, user_id, title, total_pages, last_page_read, reading_progress, is_completed \
             FROM books WHERE id = $1",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Book {} not found", book_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn set_total_pages(&self, book_id: Uuid, total_pages: u32) -> PortResult<()> {
        // Set once: a book that already knows its page count keeps it.
        sqlx::query("UPDATE books SET total_pages = $1 WHERE id = $2 AND total_pages IS NULL")
            .bind(total_pages as i32)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn save_reading_position(
        &self,
        book_id: Uuid,
        last_page_read: u32,
        reading_progress: u8,
        is_completed: bool,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE books SET last_page_read = $1, reading_progress = $2, is_completed = $3 \
             WHERE id = $4",
        )
        .bind(last_page_read as i32)
        .bind(i32::from(reading_progress))
        .bind(is_completed)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn create_session(&self, session: &ReadingSession) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO reading_sessions \
             (id, book_id, user_id, start_time, end_time, duration_minutes, pages_read) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(session.id)
        .bind(session.book_id)
        .bind(session.user_id)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.duration_minutes)
        .bind(session.pages_read as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn update_session(
        &self,
        session_id: Uuid,
        end_time: DateTime<Utc>,
        duration_minutes: i64,
        pages_read: u32,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE reading_sessions SET end_time = $1, duration_minutes = $2, pages_read = $3 \
             WHERE id = $4",
        )
        .bind(end_time)
        .bind(duration_minutes)
        .bind(pages_read as i32)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<ReadingSession>> {
        let records = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, book_id, user_id, start_time, end_time, duration_minutes, pages_read \
             FROM reading_sessions WHERE user_id = $1 ORDER BY start_time DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
