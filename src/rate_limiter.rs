//! Token-bucket rate limiter, relocated from `ai::rate_limiter` with no
//! behavioral change — the per-provider request ceiling it guards is just
//! as relevant to five LLM vendors as it was to two.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Rate limiter using the token bucket algorithm. Allows a fixed number of
/// requests per time window; once exhausted, `acquire` blocks until tokens
/// refill.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window_seconds: u64,
    tokens: Arc<Mutex<u32>>,
    last_refill: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
            tokens: Arc::new(Mutex::new(max_requests)),
            last_refill: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Conservative default shared by every cloud provider this crate talks
    /// to, mirroring `ai::rate_limiter::openai_default`/`anthropic_default`.
    pub fn provider_default() -> Self {
        Self::new(50, 60)
    }

    /// Blocks until a token is available, refilling proportionally to
    /// elapsed time since the last refill.
    pub async fn acquire(&self) {
        loop {
            let mut tokens = self.tokens.lock().await;
            let mut last_refill = self.last_refill.lock().await;

            let now = Instant::now();
            let elapsed = now.duration_since(*last_refill);
            let window_duration = Duration::from_secs(self.window_seconds);

            if elapsed >= window_duration {
                *tokens = self.max_requests;
                *last_refill = now;
            } else {
                let refill = (elapsed.as_secs_f64() / window_duration.as_secs_f64()
                    * self.max_requests as f64) as u32;
                if refill > 0 {
                    *tokens = (*tokens + refill).min(self.max_requests);
                    *last_refill = now;
                }
            }

            if *tokens > 0 {
                *tokens -= 1;
                return;
            }

            drop(tokens);
            drop(last_refill);

            let wait_time = window_duration - elapsed;
            if wait_time.as_millis() > 0 {
                tokio::time::sleep(wait_time).await;
            } else {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }

    /// Non-blocking variant: returns `false` immediately if no tokens are
    /// available rather than waiting for a refill.
    pub async fn try_acquire(&self) -> bool {
        let mut tokens = self.tokens.lock().await;
        let mut last_refill = self.last_refill.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill);
        let window_duration = Duration::from_secs(self.window_seconds);

        if elapsed >= window_duration {
            *tokens = self.max_requests;
            *last_refill = now;
        } else {
            let refill = (elapsed.as_secs_f64() / window_duration.as_secs_f64()
                * self.max_requests as f64) as u32;
            if refill > 0 {
                *tokens = (*tokens + refill).min(self.max_requests);
                *last_refill = now;
            }
        }

        if *tokens > 0 {
            *tokens -= 1;
            true
        } else {
            false
        }
    }

    #[allow(dead_code)]
    pub async fn available_tokens(&self) -> u32 {
        let mut tokens = self.tokens.lock().await;
        let mut last_refill = self.last_refill.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill);
        let window_duration = Duration::from_secs(self.window_seconds);

        if elapsed >= window_duration {
            *tokens = self.max_requests;
            *last_refill = now;
        } else {
            let refill = (elapsed.as_secs_f64() / window_duration.as_secs_f64()
                * self.max_requests as f64) as u32;
            if refill > 0 {
                *tokens = (*tokens + refill).min(self.max_requests);
                *last_refill = now;
            }
        }

        *tokens
    }
}
