//! Fixed-window rate limiter trait.
//!
//! # Algorithm
//!
//! Each key owns one window at a time:
//!
//! - The first request for a key, or the first request after the current
//!   window has elapsed, opens a new window starting *now* with count 1.
//! - Requests inside the window increment the count while it stays within
//!   `max_requests`.
//! - A request that would push the count past `max_requests` is rejected
//!   with `AuthError::TooManyAttempts`, carrying the time left in the window.
//!   Rejected requests are not counted.
//!
//! [`FixedWindow::evaluate`] is the reference implementation of these rules;
//! the stores reproduce it atomically in SQL or Lua.

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// How many requests a key may make per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum requests accepted inside one window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Longest window a policy may use.
    pub const MAX_WINDOW: Duration = Duration::from_secs(366 * 24 * 60 * 60);

    /// Create a policy.
    #[must_use]
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Window length as a `chrono` duration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InternalError` if the window is not representable.
    pub fn window_span(&self) -> Result<chrono::Duration> {
        chrono::Duration::from_std(self.window).map_err(|_| {
            AuthError::InternalError(format!("Rate limit window out of range: {:?}", self.window))
        })
    }

    /// When a window opened at `window_start` ends.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InternalError` if the end is past the calendar.
    pub fn window_end(&self, window_start: DateTime<Utc>) -> Result<DateTime<Utc>> {
        window_start
            .checked_add_signed(self.window_span()?)
            .ok_or_else(|| AuthError::InternalError("Rate limit window end overflowed".into()))
    }

    /// Windows opened at or before this instant have elapsed at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InternalError` if the instant is before the calendar.
    pub fn elapsed_before(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        now.checked_sub_signed(self.window_span()?)
            .ok_or_else(|| AuthError::InternalError("Rate limit window start underflowed".into()))
    }

    /// Whether `state` is still the current window at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InternalError` if the window end overflows.
    pub fn is_open(&self, state: &WindowState, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.window_end(state.window_start)? > now)
    }
}

/// Outcome of an accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    /// Requests counted in the current window, including this one
    pub count: u32,
    /// Requests still allowed in the current window
    pub remaining: u32,
    /// When the current window ends
    pub resets_at: DateTime<Utc>,
}

/// Persisted state of one key's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Requests counted so far
    pub count: u32,
    /// When the window opened
    pub window_start: DateTime<Utc>,
}

/// Pure fixed-window evaluation.
#[derive(Debug, Clone, Copy)]
pub struct FixedWindow;

impl FixedWindow {
    /// Apply one request at `now` to `current`.
    ///
    /// Returns the new window state and the status to report.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TooManyAttempts` when the window is full; the
    /// stored state must then be left unchanged. Returns
    /// `AuthError::InternalError` when the window end is not representable.
    pub fn evaluate(
        current: Option<WindowState>,
        now: DateTime<Utc>,
        policy: RateLimitPolicy,
    ) -> Result<(WindowState, RateLimitStatus)> {
        let state = match current {
            Some(state) if policy.is_open(&state, now)? => {
                if state.count >= policy.max_requests {
                    return Err(Self::rejection(policy.window_end(state.window_start)?, now));
                }
                WindowState {
                    count: state.count + 1,
                    window_start: state.window_start,
                }
            }
            _ => {
                if policy.max_requests == 0 {
                    return Err(Self::rejection(policy.window_end(now)?, now));
                }
                WindowState {
                    count: 1,
                    window_start: now,
                }
            }
        };

        Ok((state, Self::status(state, policy)?))
    }

    /// Status for an accepted window state.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InternalError` if the window end overflows.
    pub fn status(state: WindowState, policy: RateLimitPolicy) -> Result<RateLimitStatus> {
        Ok(RateLimitStatus {
            count: state.count,
            remaining: policy.max_requests.saturating_sub(state.count),
            resets_at: policy.window_end(state.window_start)?,
        })
    }

    /// Rejection error for a window ending at `resets_at`.
    #[must_use]
    pub fn rejection(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> AuthError {
        let retry_after = (resets_at - now).to_std().unwrap_or(Duration::ZERO);
        AuthError::TooManyAttempts { retry_after }
    }
}

/// Rate limiter keyed by an arbitrary identifier.
///
/// # Example
///
/// ```no_run
/// use campus_auth::providers::{RateLimitPolicy, RateLimiter};
/// use std::time::Duration;
///
/// # async fn example(limiter: &dyn RateLimiter) -> Result<(), Box<dyn std::error::Error>> {
/// let policy = RateLimitPolicy::new(10, Duration::from_secs(60));
/// let status = limiter.check_and_record("validate-order:some-user", policy).await?;
/// println!("{} requests left", status.remaining);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key`, or reject it.
    ///
    /// # Errors
    ///
    /// - `AuthError::TooManyAttempts` - window is full
    /// - `AuthError::DatabaseError` / `AuthError::InternalError` - backend failure
    async fn check_and_record(&self, key: &str, policy: RateLimitPolicy) -> Result<RateLimitStatus>;

    /// Requests counted in the key's current window (0 if none or expired).
    ///
    /// # Errors
    ///
    /// Returns error if the backend operation fails.
    async fn get_attempts(&self, key: &str, policy: RateLimitPolicy) -> Result<u32>;

    /// Forget the key's window.
    ///
    /// # Errors
    ///
    /// Returns error if the backend operation fails.
    async fn reset(&self, key: &str) -> Result<()>;
}
