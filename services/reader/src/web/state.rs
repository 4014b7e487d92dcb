//! services/reader/src/web/state.rs
//!
//! Defines the application's shared state and the per-connection reader
//! state. One WebSocket connection is one reader-screen instance; its page
//! registry, observer bookkeeping, and cancellation token live and die with
//! the connection.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use shelfside_core::observer::PageObserver;
use shelfside_core::ports::ProgressStore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProgressStore>,
    pub config: Arc<Config>,
}

//=========================================================================================
// ReaderState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active reader screen.
pub struct ReaderState {
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub header_offset: f64,
    /// Discovered once, after the first successful document load.
    pub total_pages: Option<u32>,
    /// Page registry: page number to absolute top offset. At most one
    /// entry per page; a remount overwrites the old handle.
    pub page_tops: HashMap<u32, f64>,
    pub observer: PageObserver,
    /// The initializing gate shared between the seeker (its single writer)
    /// and the observer.
    pub gate: Arc<AtomicBool>,
    /// Cancels the seek/jump retry loops when the screen unmounts.
    pub cancellation_token: CancellationToken,
}

impl ReaderState {
    pub fn new(user_id: Uuid, book_id: Uuid, header_offset: f64) -> Self {
        // The gate starts closed so stray frames arriving before the seeker
        // runs can't report a spurious page 1.
        let gate = Arc::new(AtomicBool::new(true));
        Self {
            user_id,
            book_id,
            header_offset,
            total_pages: None,
            page_tops: HashMap::new(),
            observer: PageObserver::new(header_offset, gate.clone()),
            gate,
            cancellation_token: CancellationToken::new(),
        }
    }
}
