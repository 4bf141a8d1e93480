use std::time::{Duration, Instant};

/// Token bucket guarding one connection's inbound messages.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_every: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(max_tokens: u32, refill_every: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_every,
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        if self.refill_every.is_zero() {
            self.tokens = self.max_tokens;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = (elapsed.as_millis() / self.refill_every.as_millis().max(1)) as u32;
        if earned > 0 {
            self.tokens = self.tokens.saturating_add(earned).min(self.max_tokens);
            // Keep the remainder so partial intervals still count
            self.last_refill += self.refill_every * earned;
        }
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill(Instant::now());
        self.tokens
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(30, Duration::from_millis(500))
    }
}
