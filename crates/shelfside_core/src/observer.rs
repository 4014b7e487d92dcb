//! crates/shelfside_core/src/observer.rs
//!
//! Continuous current-page detection for free-scrolling documents.
//!
//! The reader client streams per-page visibility measurements; this observer
//! reduces each frame of measurements to a single "current page" and reports
//! only actual changes. While the initializing gate is set (the seeker is
//! still moving the viewport into place), frames are recorded but never
//! committed, so a half-finished programmatic scroll can't report page 1.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::domain::IntersectionRecord;

pub struct PageObserver {
    header_offset: f64,
    records: HashMap<u32, IntersectionRecord>,
    current: Option<u32>,
    /// Single-writer gate owned by the seeker; the observer only reads it.
    gate: Arc<AtomicBool>,
    /// True once a frame has been swallowed by the gate; the next open
    /// frame starts from a clean slate.
    suspended: bool,
}

impl PageObserver {
    pub fn new(header_offset: f64, gate: Arc<AtomicBool>) -> Self {
        Self {
            header_offset,
            records: HashMap::new(),
            current: None,
            gate,
            suspended: false,
        }
    }

    pub fn current_page(&self) -> Option<u32> {
        self.current
    }

    /// Drops all prior measurements. Both a new total page count and a new
    /// header offset invalidate them.
    pub fn reset(&mut self, header_offset: f64) {
        self.header_offset = header_offset;
        self.records.clear();
    }

    /// A page element unmounted; its measurement goes with it.
    pub fn page_unmounted(&mut self, page: u32) {
        self.records.remove(&page);
    }

    /// Feeds one frame of visibility measurements and returns the new
    /// current page if it changed. Returns `None` on no change and always
    /// while the gate is set.
    pub fn observe(&mut self, frame: &[IntersectionRecord]) -> Option<u32> {
        if self.gate.load(AtomicOrdering::Acquire) {
            for record in frame {
                self.records.insert(record.page, *record);
            }
            self.suspended = true;
            return None;
        }
        if self.suspended {
            // Measurements taken during the programmatic scroll describe
            // positions the viewport has since left behind.
            self.records.clear();
            self.suspended = false;
        }
        for record in frame {
            self.records.insert(record.page, *record);
        }
        let best = self.best_candidate()?;
        if self.current == Some(best) {
            return None;
        }
        self.current = Some(best);
        Some(best)
    }

    /// Highest visibility ratio wins; an exact tie goes to the page whose
    /// top edge sits closest to the header-offset line. Pages with ratio 0
    /// are never candidates.
    fn best_candidate(&self) -> Option<u32> {
        self.records
            .values()
            .filter(|r| r.ratio > 0.0)
            .min_by(|a, b| {
                b.ratio
                    .partial_cmp(&a.ratio)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| {
                        let da = (a.top - self.header_offset).abs();
                        let db = (b.top - self.header_offset).abs();
                        da.partial_cmp(&db).unwrap_or(Ordering::Equal)
                    })
                    .then_with(|| a.page.cmp(&b.page))
            })
            .map(|r| r.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(page: u32, ratio: f64, top: f64) -> IntersectionRecord {
        IntersectionRecord { page, ratio, top }
    }

    fn open_observer(header_offset: f64) -> PageObserver {
        PageObserver::new(header_offset, Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn highest_ratio_wins() {
        let mut observer = open_observer(64.0);
        let page = observer.observe(&[rec(1, 0.2, 10.0), rec(2, 0.8, 300.0)]);
        assert_eq!(page, Some(2));
    }

    #[test]
    fn exact_tie_goes_to_the_page_nearest_the_header_line() {
        let mut observer = open_observer(64.0);
        // A sits 40px from the line, B sits 10px from it.
        let page = observer.observe(&[rec(1, 0.6, 104.0), rec(2, 0.6, 74.0)]);
        assert_eq!(page, Some(2));
    }

    #[test]
    fn zero_ratio_pages_are_never_candidates() {
        let mut observer = open_observer(0.0);
        assert_eq!(observer.observe(&[rec(1, 0.0, 0.0), rec(2, 0.0, 900.0)]), None);
        assert_eq!(observer.current_page(), None);
    }

    #[test]
    fn no_redundant_notifications() {
        let mut observer = open_observer(0.0);
        assert_eq!(observer.observe(&[rec(3, 0.9, 12.0)]), Some(3));
        assert_eq!(observer.observe(&[rec(3, 0.7, 40.0)]), None);
        assert_eq!(observer.observe(&[rec(4, 0.8, 20.0), rec(3, 0.1, -500.0)]), Some(4));
    }

    #[test]
    fn suspended_while_the_gate_is_set_then_notifies_on_the_next_frame() {
        let gate = Arc::new(AtomicBool::new(true));
        let mut observer = PageObserver::new(0.0, gate.clone());

        for _ in 0..5 {
            assert_eq!(observer.observe(&[rec(1, 1.0, 0.0)]), None);
        }
        assert_eq!(observer.current_page(), None);

        gate.store(false, AtomicOrdering::Release);
        assert_eq!(observer.observe(&[rec(7, 0.5, 8.0)]), Some(7));
    }

    #[test]
    fn measurements_taken_mid_seek_do_not_outlive_the_gate() {
        let gate = Arc::new(AtomicBool::new(true));
        let mut observer = PageObserver::new(0.0, gate.clone());

        // Page 1 fills the viewport while the seeker is still scrolling.
        assert_eq!(observer.observe(&[rec(1, 1.0, 0.0)]), None);

        // After the seek lands, page 17 is only half visible. The stale
        // page-1 record must not beat it.
        gate.store(false, AtomicOrdering::Release);
        assert_eq!(observer.observe(&[rec(17, 0.5, 4.0)]), Some(17));
        assert_eq!(observer.current_page(), Some(17));
    }

    #[test]
    fn unmounted_pages_stop_competing() {
        let mut observer = open_observer(0.0);
        assert_eq!(observer.observe(&[rec(2, 0.9, 5.0), rec(3, 0.4, 600.0)]), Some(2));
        observer.page_unmounted(2);
        assert_eq!(observer.observe(&[]), Some(3));
    }

    #[test]
    fn reset_drops_stale_measurements() {
        let mut observer = open_observer(0.0);
        assert_eq!(observer.observe(&[rec(5, 0.9, 5.0)]), Some(5));
        observer.reset(80.0);
        // Page 5's old measurement is gone; only the fresh frame counts.
        assert_eq!(observer.observe(&[rec(1, 0.3, 90.0)]), Some(1));
    }
}
