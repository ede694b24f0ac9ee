use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

/// Source of wall-clock time and timed waits.
///
/// The transport never calls `tokio::time` directly so that retry waits can
/// be observed (and skipped) in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local time, used for log sink timestamps.
    fn now(&self) -> DateTime<Local>;

    /// Suspends the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// The real clock, backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
