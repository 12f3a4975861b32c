// Rate limiting for platform API calls with exponential backoff.
//
// The X API enforces per-endpoint quotas over 15-minute windows (300
// requests for user lookups, 900 for timeline reads at our access tier).
// This module provides a sliding-window rate limiter that throttles
// requests to stay under the quota, plus a retry wrapper that handles
// RateLimited errors with backoff.
//
// The limiter is shared across concurrent tasks via Arc<RateLimiter>,
// using interior mutability (Mutex) so callers only need &self.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::SourceError;

/// Sliding window length matching the platform's quota window.
pub const QUOTA_WINDOW_SECONDS: u64 = 15 * 60;

/// Per-window quota for user lookup endpoints.
pub const USERS_QUOTA: u32 = 300;

/// Per-window quota for timeline read endpoints.
pub const POSTS_QUOTA: u32 = 900;

/// A sliding-window rate limiter for API calls.
///
/// Tracks request timestamps in a sliding window and pauses when the
/// configured quota is reached. Thread-safe via interior mutability so it
/// can be shared across concurrent tasks with `Arc<RateLimiter>`.
pub struct RateLimiter {
    /// Timestamps of recent requests within the current window.
    requests: Mutex<VecDeque<Instant>>,
    /// Maximum number of requests allowed per window.
    max_requests: u32,
    /// Duration of the sliding window.
    window: Duration,
    /// Minimum delay between consecutive requests to avoid bursts.
    min_delay: Duration,
    /// Timestamp of the last request (for enforcing min_delay).
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests_per_window: u32, window_seconds: u64, min_delay_ms: u64) -> Self {
        Self {
            requests: Mutex::new(VecDeque::new()),
            max_requests: max_requests_per_window,
            window: Duration::from_secs(window_seconds),
            min_delay: Duration::from_millis(min_delay_ms),
            last_request: Mutex::new(None),
        }
    }

    /// Limiter tuned for the user lookup quota.
    pub fn for_users() -> Self {
        Self::new(USERS_QUOTA, QUOTA_WINDOW_SECONDS, 100)
    }

    /// Limiter tuned for the timeline read quota.
    pub fn for_posts() -> Self {
        Self::new(POSTS_QUOTA, QUOTA_WINDOW_SECONDS, 100)
    }

    /// Wait if necessary before making a request.
    ///
    /// Enforces the minimum inter-request delay, then sleeps until the
    /// sliding window has room if it is full.
    pub async fn acquire(&self) {
        // Compute the wait while holding the lock, then drop the lock
        // before sleeping (MutexGuard must not live across await).
        let min_delay_wait = {
            let last = self.last_request.lock().unwrap();
            match *last {
                Some(last_time) => {
                    let elapsed = last_time.elapsed();
                    (elapsed < self.min_delay).then(|| self.min_delay - elapsed)
                }
                None => None,
            }
        };

        if let Some(wait) = min_delay_wait {
            tokio::time::sleep(wait).await;
        }

        loop {
            let action = {
                let now = Instant::now();
                let mut requests = self.requests.lock().unwrap();

                // Evict requests that have fallen outside the window
                while let Some(&oldest) = requests.front() {
                    if now.duration_since(oldest) > self.window {
                        requests.pop_front();
                    } else {
                        break;
                    }
                }

                if (requests.len() as u32) < self.max_requests {
                    requests.push_back(now);
                    let mut last = self.last_request.lock().unwrap();
                    *last = Some(now);
                    None
                } else {
                    // Window is full; wait until the oldest request expires
                    let oldest = *requests.front().unwrap();
                    let wait_until = oldest + self.window;
                    Some(wait_until.duration_since(now))
                }
            };

            match action {
                None => return,
                Some(wait) => {
                    info!(
                        delay_ms = wait.as_millis() as u64,
                        "Rate limit window full, waiting {}ms",
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// Maximum number of retry attempts on RateLimited errors.
const MAX_RETRIES: u32 = 5;

/// Base delay for exponential backoff (doubles each retry).
const BASE_BACKOFF: Duration = Duration::from_secs(2);

/// Maximum backoff delay to cap exponential growth.
const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Retry an async source operation with backoff on RateLimited errors.
///
/// When the platform supplies a Retry-After hint, that wins over the
/// computed exponential backoff. Non-retryable errors (NotFound,
/// Validation, Transport) are returned immediately.
///
/// The limiter's `acquire()` runs before each attempt so retries still
/// respect the sliding window.
pub async fn with_retry<F, Fut, T>(
    rate_limiter: &RateLimiter,
    operation: F,
) -> Result<T, SourceError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0u32;

    loop {
        rate_limiter.acquire().await;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= MAX_RETRIES {
                    return Err(err);
                }

                attempt += 1;

                let backoff = BASE_BACKOFF
                    .saturating_mul(1u32 << attempt)
                    .min(MAX_BACKOFF);

                let wait = match &err {
                    SourceError::RateLimited { retry_after } if !retry_after.is_zero() => {
                        (*retry_after).min(MAX_BACKOFF)
                    }
                    _ => backoff,
                };

                warn!(
                    attempt = attempt,
                    max_retries = MAX_RETRIES,
                    backoff_secs = wait.as_secs_f64(),
                    "Rate limited, retrying in {:.1}s (attempt {}/{})",
                    wait.as_secs_f64(),
                    attempt,
                    MAX_RETRIES,
                );

                tokio::time::sleep(wait).await;
            }
        }
    }
}
