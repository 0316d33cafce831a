//! Time sources for stamping and bounding transfers.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::time::Instant;

use crate::transfer::Timestamp;

/// A source of the current time.
///
/// Deadlines handed to the dispatcher are read against `now`. The dispatcher
/// converts the time remaining into a wait on tokio's timer.
pub trait Clock: Send + Sync {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Current time on both clocks.
    fn timestamp(&self) -> Timestamp {
        Timestamp {
            system: SystemTime::now(),
            monotonic: self.now().into_std(),
        }
    }
}

/// The tokio clock. Honors paused time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn timestamp(&self) -> Timestamp {
        (**self).timestamp()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn timestamp(&self) -> Timestamp {
        (**self).timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_follows_paused_time() {
        let clock = SystemClock;
        let before = clock.now();

        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(clock.now() - before, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_timestamp_uses_clock() {
        let clock = Arc::new(SystemClock);
        let before = clock.now().into_std();
        let stamp = clock.timestamp();
        assert!(stamp.monotonic >= before);
    }
}
