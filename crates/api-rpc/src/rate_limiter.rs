//! Rate Limiter (Token Bucket Algorithm)
//!
//! Shared by every RPC method; a chat transport flooding `chat.message.v1`
//! cannot starve the other callers of the daemon.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Token bucket refilled continuously at `refill_rate` tokens per second
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    max_tokens: f64,
    refill_rate: f64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_tokens` - Maximum burst size
    /// * `refill_rate` - Tokens added per second
    ///
    /// # Example
    /// Allow 100 requests/sec with burst of 200:
    /// `RateLimiter::new(200, 100)`
    pub fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: f64::from(max_tokens),
                last_refill: Instant::now(),
            }),
            max_tokens: f64::from(max_tokens),
            refill_rate: f64::from(refill_rate),
        }
    }

    /// Consume one token; false if the caller is throttled
    pub fn check(&self) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut bucket);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Whole tokens currently available
    pub fn remaining(&self) -> u32 {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut bucket);
        bucket.tokens.floor() as u32
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        bucket.last_refill = now;
    }
}
