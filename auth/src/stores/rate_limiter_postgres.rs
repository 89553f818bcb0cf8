//! `PostgreSQL` fixed-window rate limiter.
//!
//! One row per key in `rate_limits`. A single upsert opens, advances or
//! refuses the window, so the check and the increment are one atomic
//! statement even with many service replicas.
//!
//! # Example
//!
//! ```no_run
//! use campus_auth::stores::PostgresRateLimiter;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/campus").await?;
//! let limiter = PostgresRateLimiter::new(pool);
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::{FixedWindow, RateLimitPolicy, RateLimitStatus, RateLimiter, WindowState};
use async_trait::async_trait;
use campus_core::environment::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;

/// Opens a window when none exists or the stored one began at or before
/// `$4` (now - window). Otherwise increments, unless the row is full, in
/// which case the `WHERE` suppresses the update and no row is returned.
const UPSERT_WINDOW: &str = r"
INSERT INTO rate_limits AS rl (key, count, window_start, expires_at)
VALUES ($1, 1, $2, $3)
ON CONFLICT (key) DO UPDATE SET
    count = CASE WHEN rl.window_start <= $4 THEN 1 ELSE rl.count + 1 END,
    window_start = CASE WHEN rl.window_start <= $4 THEN $2 ELSE rl.window_start END,
    expires_at = CASE WHEN rl.window_start <= $4 THEN $3 ELSE rl.expires_at END
WHERE rl.window_start <= $4 OR rl.count < $5
RETURNING count, window_start
";

/// `PostgreSQL`-backed [`RateLimiter`].
#[derive(Clone)]
pub struct PostgresRateLimiter {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresRateLimiter {
    /// Create a limiter using the system clock.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Create a limiter with an injected clock.
    #[must_use]
    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Delete rows whose window has ended.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DatabaseError` if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE expires_at <= $1")
            .bind(self.clock.now())
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to purge rate limits: {e}")))?;

        let purged = result.rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired rate limit windows");
        }

        Ok(purged)
    }

    async fn current_window(&self, key: &str) -> Result<Option<WindowState>> {
        let row = sqlx::query("SELECT count, window_start FROM rate_limits WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to read rate limit: {e}")))?;

        row.map(|row| window_from_row(&row)).transpose()
    }
}

fn window_from_row(row: &sqlx::postgres::PgRow) -> Result<WindowState> {
    let count: i32 = row.try_get("count")?;
    let window_start: DateTime<Utc> = row.try_get("window_start")?;

    Ok(WindowState {
        count: u32::try_from(count).unwrap_or(0),
        window_start,
    })
}

#[async_trait]
impl RateLimiter for PostgresRateLimiter {
    async fn check_and_record(&self, key: &str, policy: RateLimitPolicy) -> Result<RateLimitStatus> {
        let now = self.clock.now();
        let window_end = policy.window_end(now)?;
        let elapsed_before = policy.elapsed_before(now)?;
        let max = i32::try_from(policy.max_requests).unwrap_or(i32::MAX);

        if policy.max_requests == 0 {
            return Err(FixedWindow::rejection(window_end, now));
        }

        let row = sqlx::query(UPSERT_WINDOW)
            .bind(key)
            .bind(now)
            .bind(window_end)
            .bind(elapsed_before)
            .bind(max)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key, "Rate limit upsert failed");
                AuthError::DatabaseError(format!("Failed to check and record rate limit: {e}"))
            })?;

        if let Some(row) = row {
            let state = window_from_row(&row)?;
            tracing::debug!(
                key = %key,
                attempts = state.count,
                max_requests = policy.max_requests,
                "Rate limit check passed"
            );
            return FixedWindow::status(state, policy);
        }

        // Full window: the upsert left the row alone.
        let resets_at = match self.current_window(key).await? {
            Some(state) => policy.window_end(state.window_start)?,
            None => window_end,
        };

        tracing::warn!(
            rate_limit_exceeded = true,
            key = %key,
            max_requests = policy.max_requests,
            "Rate limit exceeded"
        );

        Err(FixedWindow::rejection(resets_at, now))
    }

    async fn get_attempts(&self, key: &str, policy: RateLimitPolicy) -> Result<u32> {
        let now = self.clock.now();
        match self.current_window(key).await? {
            Some(state) if policy.is_open(&state, now)? => Ok(state.count),
            _ => Ok(0),
        }
    }

    async fn reset(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM rate_limits WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(format!("Failed to reset rate limit: {e}")))?;

        tracing::info!(key = %key, "Reset rate limit");
        Ok(())
    }
}
