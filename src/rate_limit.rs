use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Process-wide token bucket guarding outbound fetch traffic.
///
/// One instance is shared by `Arc` across every concurrent request; slot
/// accounting happens under a single async mutex so interleaved acquires
/// cannot corrupt the window state. Waiting is cooperative: a caller that
/// finds the window exhausted sleeps until the window rolls over.
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    total_acquired: AtomicU64,
    state: Mutex<Window>,
}

struct Window {
    started: Instant,
    used: u32,
}

impl RateLimiter {
    pub fn new(capacity: u32, window: Duration) -> Self {
        assert!(capacity > 0, "rate limiter capacity must be non-zero");
        Self {
            capacity,
            window,
            total_acquired: AtomicU64::new(0),
            state: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Limiter allowing `capacity` acquisitions per one-second window.
    pub fn per_second(capacity: u32) -> Self {
        Self::new(capacity, Duration::from_secs(1))
    }

    /// Take one slot, waiting for the next window if the current one is
    /// exhausted.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.state.lock().await;
                let now = Instant::now();

                if now.duration_since(window.started) >= self.window {
                    window.started = now;
                    window.used = 0;
                }

                if window.used < self.capacity {
                    window.used += 1;
                    self.total_acquired.fetch_add(1, Ordering::Relaxed);
                    return;
                }

                self.window - now.duration_since(window.started)
            };

            debug!("rate limiter window exhausted, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of slots handed out since construction.
    pub fn total_acquired(&self) -> u64 {
        self.total_acquired.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn acquires_up_to_capacity_without_waiting() {
        let limiter = RateLimiter::per_second(5);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.total_acquired(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn sixth_acquire_waits_for_next_window() {
        let limiter = RateLimiter::per_second(5);
        let start = Instant::now();

        for _ in 0..6 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(limiter.total_acquired(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn window_refills_after_rollover() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        limiter.acquire().await;
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
