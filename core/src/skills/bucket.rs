//! Per-skill token bucket rate limiter (§4.1 "Rate limits", §11 burst
//! capacity resolution).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A token bucket refilled continuously at `max_per_minute / 60` tokens
/// per second, with burst capacity equal to `max_per_minute` (§11).
pub struct TokenBucket {
    max_per_minute: u32,
    /// Tokens available, stored as a fixed-point value (micro-tokens) so
    /// it can live in an `AtomicU64` without a lock.
    micro_tokens: AtomicU64,
    last_refill: parking_lot::Mutex<Instant>,
}

const MICRO: f64 = 1_000_000.0;

impl TokenBucket {
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute,
            micro_tokens: AtomicU64::new((max_per_minute as f64 * MICRO) as u64),
            last_refill: parking_lot::Mutex::new(Instant::now()),
        }
    }

    fn refill(&self) {
        let mut last = self.last_refill.lock();
        let elapsed = last.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        *last = Instant::now();
        let refill_rate = self.max_per_minute as f64 / 60.0;
        let added = (elapsed * refill_rate * MICRO) as u64;
        let capacity = (self.max_per_minute as f64 * MICRO) as u64;
        self.micro_tokens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some((current + added).min(capacity))
            })
            .ok();
    }

    /// Try to consume one token; returns `true` on success.
    pub fn try_consume(&self) -> bool {
        self.refill();
        let one = MICRO as u64;
        self.micro_tokens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                if current >= one {
                    Some(current - one)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Minimum wait before a token should be available again.
    pub fn retry_after(&self) -> Duration {
        let refill_rate = self.max_per_minute as f64 / 60.0;
        if refill_rate <= 0.0 {
            return Duration::from_secs(60);
        }
        Duration::from_secs_f64(1.0 / refill_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_up_to_burst_capacity() {
        let bucket = TokenBucket::new(60);
        for _ in 0..60 {
            assert!(bucket.try_consume());
        }
        assert!(!bucket.try_consume());
    }

    #[test]
    fn refills_over_time() {
        let bucket = TokenBucket::new(60);
        for _ in 0..60 {
            assert!(bucket.try_consume());
        }
        std::thread::sleep(Duration::from_millis(50));
        assert!(bucket.try_consume());
    }
}
