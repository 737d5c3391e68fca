//! Fixed-window rate limiter middleware.
//!
//! Admits up to `max_per_sec` requests in each wall-clock second and rejects
//! the rest with a JSON 429.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

#[derive(Debug, Default)]
struct Window {
    second: u64,
    admitted: u64,
}

/// Shared limiter state. Clones share one window.
#[derive(Clone)]
pub struct RateLimiter {
    max_per_sec: u64,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec,
            window: Arc::new(Mutex::new(Window::default())),
        }
    }

    /// Returns true if the request fits in the current second.
    pub fn try_acquire(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.try_acquire_at(now)
    }

    fn try_acquire_at(&self, second: u64) -> bool {
        let mut window = match self.window.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if window.second != second {
            window.second = second;
            window.admitted = 0;
        }
        if window.admitted < self.max_per_sec {
            window.admitted += 1;
            true
        } else {
            false
        }
    }
}

/// Axum middleware that enforces the rate limit.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        next.run(req).await
    } else {
        tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
        ApiError::TooManyRequests.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.try_acquire_at(10));
        assert!(limiter.try_acquire_at(10));
        assert!(limiter.try_acquire_at(10));
        assert!(!limiter.try_acquire_at(10));
    }

    #[test]
    fn test_new_second_resets() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.try_acquire_at(10));
        assert!(!limiter.try_acquire_at(10));
        assert!(limiter.try_acquire_at(11));
    }

    #[test]
    fn test_clones_share_window() {
        let limiter = RateLimiter::new(1);
        let other = limiter.clone();
        assert!(limiter.try_acquire_at(5));
        assert!(!other.try_acquire_at(5));
    }
}
