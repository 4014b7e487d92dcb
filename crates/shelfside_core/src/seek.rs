//! crates/shelfside_core/src/seek.rs
//!
//! One-shot scroll-to-saved-page on mount.
//!
//! A freshly mounted document lays its pages out asynchronously, so the
//! saved page may not exist yet when the reader opens. The seeker holds the
//! observer's gate closed, retries locating the target on a fixed interval,
//! scrolls once it can, and only releases the gate after the viewport has
//! settled. Give-up is graceful: the gate is always cleared, the seek never
//! hangs the reader.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ports::ViewportPort;
use crate::retry::RetryPolicy;

/// Fixed visual margin kept between the header line and the page top.
pub const SEEK_MARGIN_PX: f64 = 8.0;

/// 100ms spacing, 40 attempts: about four seconds before giving up.
pub const SEEK_RETRY: RetryPolicy = RetryPolicy::new(40, Duration::from_millis(100));

/// Layout frames to wait after a programmatic scroll before the observer
/// is allowed to report again.
pub const SETTLE_FRAMES: u32 = 2;

/// Upper bound on the settle wait. A hidden tab stops producing frames,
/// and the gate must not stay closed waiting for ones that never come.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Target scroll offset for a page: its absolute top, minus the header
/// reservation and the visual margin, never negative.
pub fn scroll_offset(page_top: f64, header_offset: f64) -> f64 {
    (page_top - header_offset - SEEK_MARGIN_PX).max(0.0)
}

/// The initial position seek. The target page is captured once at
/// construction; later changes to the current page must not re-trigger it.
pub struct InitialSeek {
    target_page: u32,
    header_offset: f64,
    gate: Arc<AtomicBool>,
}

impl InitialSeek {
    pub fn new(target_page: u32, header_offset: f64, gate: Arc<AtomicBool>) -> Self {
        Self {
            target_page,
            header_offset,
            gate,
        }
    }

    /// Runs the seek to completion. Consumes `self`: this is strictly
    /// one-shot. The gate is cleared on every exit path.
    pub async fn run(self, viewport: &dyn ViewportPort, cancel: &CancellationToken) {
        if self.target_page <= 1 {
            // Nothing to scroll to; the observer is live from the start.
            self.gate.store(false, Ordering::Release);
            return;
        }

        self.gate.store(true, Ordering::Release);

        let target = self.target_page;
        let top = SEEK_RETRY
            .run(cancel, || async move {
                viewport.page_top(target).await.ok().flatten()
            })
            .await;

        match top {
            Some(top) => {
                let offset = scroll_offset(top, self.header_offset);
                if viewport.scroll_to(offset, false).await.is_ok() {
                    // Let layout and scroll settle so the observer doesn't
                    // fire mid-scroll and report the wrong page, but never
                    // hold the gate past the timeout or cancellation.
                    tokio::select! {
                        _ = viewport.settle(SETTLE_FRAMES) => {}
                        _ = tokio::time::sleep(SETTLE_TIMEOUT) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
            }
            None => {
                debug!(page = self.target_page, "initial seek gave up; page never mounted");
            }
        }

        self.gate.store(false, Ordering::Release);
    }
}
