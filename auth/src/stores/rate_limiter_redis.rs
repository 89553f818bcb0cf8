//! Redis-based fixed-window rate limiter.
//!
//! Each key is a plain counter whose TTL is the remaining window. A Lua
//! script reads, increments and arms the expiry in one round trip, so
//! concurrent callers never both pass the last free slot and rejected
//! requests leave the counter untouched.

use crate::error::{AuthError, Result};
use crate::providers::{FixedWindow, RateLimitPolicy, RateLimitStatus, RateLimiter};
use async_trait::async_trait;
use campus_core::environment::{Clock, SystemClock};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use std::sync::Arc;

/// Returns `{accepted, count, pttl_ms}`.
const CHECK_AND_RECORD: &str = r"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
  return {0, current, redis.call('PTTL', KEYS[1])}
end
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[2])
end
return {1, count, redis.call('PTTL', KEYS[1])}
";

/// `Redis`-backed [`RateLimiter`].
///
/// # Example
///
/// ```no_run
/// use campus_auth::stores::RedisRateLimiter;
/// use campus_auth::providers::{RateLimitPolicy, RateLimiter};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = RedisRateLimiter::new("redis://127.0.0.1:6379").await?;
/// let policy = RateLimitPolicy::new(10, Duration::from_secs(60));
/// limiter.check_and_record("validate-order:42", policy).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn_manager: ConnectionManager,
    script: Arc<Script>,
    clock: Arc<dyn Clock>,
}

impl RedisRateLimiter {
    /// Connect to `Redis` at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns error if connection to `Redis` fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            AuthError::InternalError(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            AuthError::InternalError(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self::from_manager(conn_manager))
    }

    /// Wrap an existing connection manager.
    #[must_use]
    pub fn from_manager(conn_manager: ConnectionManager) -> Self {
        Self {
            conn_manager,
            script: Arc::new(Script::new(CHECK_AND_RECORD)),
            clock: Arc::new(SystemClock),
        }
    }

    fn rate_limit_key(key: &str) -> String {
        format!("rate_limit:{key}")
    }

    fn window_ms(policy: RateLimitPolicy) -> u64 {
        u64::try_from(policy.window.as_millis())
            .unwrap_or(u64::MAX)
            .max(1)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check_and_record(&self, key: &str, policy: RateLimitPolicy) -> Result<RateLimitStatus> {
        let mut conn = self.conn_manager.clone();
        let rate_key = Self::rate_limit_key(key);

        let (accepted, count, pttl_ms): (u8, u32, i64) = self
            .script
            .key(&rate_key)
            .arg(policy.max_requests)
            .arg(Self::window_ms(policy))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    key = %key,
                    "Redis script failed during rate limit check"
                );
                AuthError::InternalError(format!("Failed to check and record rate limit: {e}"))
            })?;

        let now = self.clock.now();
        let resets_at = now
            .checked_add_signed(chrono::Duration::milliseconds(pttl_ms.max(0)))
            .ok_or_else(|| AuthError::InternalError("Rate limit reset time overflowed".into()))?;

        if accepted == 0 {
            tracing::warn!(
                rate_limit_exceeded = true,
                key = %key,
                attempts = count,
                max_requests = policy.max_requests,
                "Rate limit exceeded"
            );
            return Err(FixedWindow::rejection(resets_at, now));
        }

        tracing::debug!(
            key = %key,
            attempts = count,
            max_requests = policy.max_requests,
            "Rate limit check passed"
        );

        Ok(RateLimitStatus {
            count,
            remaining: policy.max_requests.saturating_sub(count),
            resets_at,
        })
    }

    async fn get_attempts(&self, key: &str, _policy: RateLimitPolicy) -> Result<u32> {
        let mut conn = self.conn_manager.clone();
        let count: Option<u32> = conn.get(Self::rate_limit_key(key)).await.map_err(|e| {
            AuthError::InternalError(format!("Failed to get rate limit attempts: {e}"))
        })?;

        Ok(count.unwrap_or(0))
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let mut conn = self.conn_manager.clone();

        let _: () = conn
            .del(Self::rate_limit_key(key))
            .await
            .map_err(|e| AuthError::InternalError(format!("Failed to reset rate limit: {e}")))?;

        tracing::info!(key = %key, "Reset rate limit");

        Ok(())
    }
}
