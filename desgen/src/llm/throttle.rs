//! Minimum-interval throttling of outbound provider calls.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// A dispatch slot handed out by [`Throttle::reserve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    wait: Duration,
    slot: Option<Instant>,
    previous: Option<Instant>,
}

impl Reservation {
    /// How long the caller must wait before dispatching.
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.wait
    }
}

/// Spaces provider calls at least `interval` apart.
///
/// Shared by every pipeline run that uses the same invoker. Each caller
/// reserves its dispatch slot under the lock and then waits outside it, so
/// concurrent callers queue behind each other instead of racing on a stale
/// timestamp.
#[derive(Debug)]
pub struct Throttle {
    interval: Option<Duration>,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Creates a throttle. `None` or a zero interval disables it.
    #[must_use]
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval: interval.filter(|d| !d.is_zero()),
            last_call: Mutex::new(None),
        }
    }

    /// Creates a throttle that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Returns true if throttling is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }

    /// Returns the configured interval.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Returns the last recorded call time.
    #[must_use]
    pub fn last_call(&self) -> Option<Instant> {
        *self.last_call.lock()
    }

    /// Reserves the next dispatch slot.
    pub fn reserve(&self) -> Reservation {
        let Some(interval) = self.interval else {
            return Reservation {
                wait: Duration::ZERO,
                slot: None,
                previous: None,
            };
        };

        let now = Instant::now();
        let mut last_call = self.last_call.lock();
        let previous = *last_call;
        let wait = previous
            .map(|prev| (prev + interval).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO);
        let slot = now + wait;
        *last_call = Some(slot);
        Reservation {
            wait,
            slot: Some(slot),
            previous,
        }
    }

    /// Gives back the slot of a call that failed.
    ///
    /// The mark is restored only while it still points at this slot; a
    /// later reservation keeps its place.
    pub fn release(&self, reservation: Reservation) {
        let Some(slot) = reservation.slot else {
            return;
        };
        let mut last_call = self.last_call.lock();
        if *last_call == Some(slot) {
            *last_call = reservation.previous;
        }
    }

    /// Records a successful call completing now.
    ///
    /// The mark only moves forward, so a slow call finishing after a newer
    /// reservation does not shorten the next caller's wait.
    pub fn record_success(&self) {
        let now = Instant::now();
        let mut last_call = self.last_call.lock();
        if last_call.map_or(true, |prev| now > prev) {
            *last_call = Some(now);
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_disabled_never_waits() {
        let throttle = Throttle::disabled();
        assert_eq!(throttle.reserve().wait(), Duration::ZERO);
        assert_eq!(throttle.reserve().wait(), Duration::ZERO);
        assert!(!throttle.is_enabled());
    }

    #[test]
    fn test_zero_interval_disables() {
        assert!(!Throttle::new(Some(Duration::ZERO)).is_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let throttle = Throttle::new(Some(Duration::from_secs(1)));
        assert_eq!(throttle.reserve().wait(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_wait_full_interval() {
        let throttle = Throttle::new(Some(Duration::from_secs(1)));
        throttle.reserve();
        throttle.record_success();

        assert_eq!(throttle.reserve().wait(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_shortens_wait() {
        let throttle = Throttle::new(Some(Duration::from_secs(1)));
        throttle.reserve();
        throttle.record_success();

        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(throttle.reserve().wait(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reservations_queue() {
        let throttle = Throttle::new(Some(Duration::from_secs(1)));

        assert_eq!(throttle.reserve().wait(), Duration::ZERO);
        assert_eq!(throttle.reserve().wait(), Duration::from_secs(1));
        assert_eq!(throttle.reserve().wait(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_success_never_moves_backwards() {
        let throttle = Throttle::new(Some(Duration::from_secs(1)));
        throttle.reserve();
        throttle.reserve();
        let reserved = throttle.last_call();

        throttle.record_success();
        assert_eq!(throttle.last_call(), reserved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_slot_does_not_delay_next_call() {
        let throttle = Throttle::new(Some(Duration::from_secs(1)));
        let failed = throttle.reserve();
        throttle.release(failed);

        assert_eq!(throttle.last_call(), None);
        assert_eq!(throttle.reserve().wait(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_keeps_later_reservation() {
        let throttle = Throttle::new(Some(Duration::from_secs(1)));
        let failed = throttle.reserve();
        let queued = throttle.reserve();
        throttle.release(failed);

        assert_eq!(queued.wait(), Duration::from_secs(1));
        assert_eq!(throttle.reserve().wait(), Duration::from_secs(2));
    }
}
