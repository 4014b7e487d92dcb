pub mod domain;
pub mod observer;
pub mod ports;
pub mod progress;
pub mod retry;
pub mod scroll;
pub mod seek;
pub mod tracker;

pub use domain::{Book, IntersectionRecord, ReadingSession, ReadingStats, YearSummary};
pub use observer::PageObserver;
pub use ports::{PortError, PortResult, ProgressStore, ViewportPort};
pub use progress::ProgressAggregator;
pub use retry::RetryPolicy;
pub use scroll::ScrollController;
pub use seek::InitialSeek;
pub use tracker::{SessionTracker, TrackerState};
