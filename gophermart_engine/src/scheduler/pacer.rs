use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::{
    sync::Mutex,
    time::{sleep_until, Instant},
};

/// How often the accrual service is polled when it is not pushing back.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A capacity-one cadence gate shared by every poll.
///
/// `acquire` hands out at most one slot per interval. The interval is mutable at any time, including while another
/// task is parked in `acquire`: a waiter that is already asleep keeps its old wake-up time, and the new cadence
/// applies from the next slot. That staleness is deliberate; the accrual service only asks for an *eventual*
/// slow-down.
#[derive(Debug)]
pub struct PollPacer {
    interval_ms: AtomicU64,
    next_slot: Mutex<Instant>,
}

impl PollPacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval_ms: AtomicU64::new(as_millis(interval)), next_slot: Mutex::new(Instant::now()) }
    }

    /// Waits for the next free slot and claims it.
    pub async fn acquire(&self) {
        let mut next = self.next_slot.lock().await;
        let now = Instant::now();
        if *next > now {
            sleep_until(*next).await;
        }
        *next = (*next).max(now) + self.interval();
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Relaxed))
    }

    /// Changes the cadence. Safe to call from any task at any time.
    pub fn set_interval(&self, interval: Duration) {
        self.interval_ms.store(as_millis(interval), Ordering::Relaxed);
    }

    /// Restores the default cadence.
    pub fn reset(&self) {
        self.set_interval(DEFAULT_POLL_INTERVAL);
    }
}

impl Default for PollPacer {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

fn as_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slots_are_one_interval_apart() {
        let pacer = PollPacer::default();
        let started = Instant::now();
        pacer.acquire().await;
        assert!(started.elapsed() < DEFAULT_POLL_INTERVAL, "first slot is free");
        pacer.acquire().await;
        pacer.acquire().await;
        assert_eq!(started.elapsed(), 2 * DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn widened_interval_takes_effect_on_the_next_slot() {
        let pacer = PollPacer::default();
        pacer.acquire().await;
        pacer.set_interval(Duration::from_secs(2));
        let started = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;
        // One default gap left over from the first slot, then the widened one.
        assert_eq!(started.elapsed(), DEFAULT_POLL_INTERVAL + Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_the_default_cadence() {
        let pacer = PollPacer::default();
        pacer.set_interval(Duration::from_secs(5));
        assert_eq!(pacer.interval(), Duration::from_secs(5));
        pacer.reset();
        assert_eq!(pacer.interval(), DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_does_not_bank_extra_slots() {
        let pacer = PollPacer::default();
        pacer.acquire().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        let started = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;
        // Only one slot was banked during the idle stretch.
        assert_eq!(started.elapsed(), DEFAULT_POLL_INTERVAL);
    }
}
