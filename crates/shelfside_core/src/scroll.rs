//! crates/shelfside_core/src/scroll.rs
//!
//! Imperative "jump to page N" used by external controls (a page-number
//! input, a table of contents) after the initial mount. Best-effort: if the
//! target page never lays out within the attempt budget, the jump is
//! silently dropped. It never touches the seeker's initializing gate.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ports::ViewportPort;
use crate::retry::RetryPolicy;
use crate::seek::scroll_offset;

/// 100ms spacing, 20 attempts: about two seconds before dropping the jump.
pub const JUMP_RETRY: RetryPolicy = RetryPolicy::new(20, Duration::from_millis(100));

pub struct ScrollController {
    header_offset: f64,
    total_pages: u32,
}

impl ScrollController {
    pub fn new(header_offset: f64, total_pages: u32) -> Self {
        Self {
            header_offset,
            total_pages,
        }
    }

    /// Clamps a requested page into the document's valid range.
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages.max(1))
    }

    /// Smooth-scrolls to the requested page, waiting for its element to
    /// mount if necessary. Exhausting the attempt budget is silent.
    pub async fn jump_to(&self, page: u32, viewport: &dyn ViewportPort, cancel: &CancellationToken) {
        let page = self.clamp_page(page);

        let top = JUMP_RETRY
            .run(cancel, || async move {
                viewport.page_top(page).await.ok().flatten()
            })
            .await;

        match top {
            Some(top) => {
                let offset = scroll_offset(top, self.header_offset);
                let _ = viewport.scroll_to(offset, true).await;
            }
            None => debug!(page, "jump dropped; page never mounted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeViewport {
        tops: Mutex<HashMap<u32, f64>>,
        scrolls: Mutex<Vec<(f64, bool)>>,
    }

    impl FakeViewport {
        fn with_pages(pages: &[(u32, f64)]) -> Self {
            Self {
                tops: Mutex::new(pages.iter().copied().collect()),
                scrolls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ViewportPort for FakeViewport {
        async fn page_top(&self, page: u32) -> PortResult<Option<f64>> {
            Ok(self.tops.lock().unwrap().get(&page).copied())
        }

        async fn scroll_to(&self, offset: f64, smooth: bool) -> PortResult<()> {
            self.scrolls.lock().unwrap().push((offset, smooth));
            Ok(())
        }

        async fn settle(&self, _frames: u32) -> PortResult<()> {
            Ok(())
        }
    }

    #[test]
    fn requests_are_clamped_into_the_document_range() {
        let controller = ScrollController::new(0.0, 120);
        assert_eq!(controller.clamp_page(0), 1);
        assert_eq!(controller.clamp_page(60), 60);
        assert_eq!(controller.clamp_page(5000), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn jumps_smoothly_using_the_shared_offset_formula() {
        let viewport = FakeViewport::with_pages(&[(7, 5000.0)]);
        let controller = ScrollController::new(64.0, 10);
        let cancel = CancellationToken::new();

        controller.jump_to(7, &viewport, &cancel).await;

        assert_eq!(*viewport.scrolls.lock().unwrap(), vec![(4928.0, true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_is_silent_after_twenty_attempts() {
        let viewport = FakeViewport::with_pages(&[]);
        let controller = ScrollController::new(0.0, 10);
        let cancel = CancellationToken::new();

        let started = tokio::time::Instant::now();
        controller.jump_to(4, &viewport, &cancel).await;

        assert!(viewport.scrolls.lock().unwrap().is_empty());
        assert_eq!(started.elapsed(), Duration::from_millis(1900));
    }
}
