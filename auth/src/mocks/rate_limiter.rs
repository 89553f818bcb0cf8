//! Mock rate limiter for testing.

use crate::error::{AuthError, Result};
use crate::providers::{FixedWindow, RateLimitPolicy, RateLimitStatus, RateLimiter, WindowState};
use async_trait::async_trait;
use campus_core::environment::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory fixed-window rate limiter.
///
/// Applies [`FixedWindow::evaluate`] under a mutex, so it follows exactly the
/// same rules as the database-backed limiters. Inject a
/// `campus_testing::ManualClock` to walk across window boundaries.
///
/// ```rust
/// # use campus_auth::mocks::MockRateLimiter;
/// # use campus_auth::providers::{RateLimitPolicy, RateLimiter};
/// # use std::time::Duration;
/// # async fn example() {
/// let limiter = MockRateLimiter::new();
/// let policy = RateLimitPolicy::new(1, Duration::from_secs(60));
///
/// assert!(limiter.check_and_record("k", policy).await.is_ok());
/// assert!(limiter.check_and_record("k", policy).await.is_err());
/// # }
/// ```
#[derive(Clone)]
pub struct MockRateLimiter {
    windows: Arc<Mutex<HashMap<String, WindowState>>>,
    clock: Arc<dyn Clock>,
}

impl MockRateLimiter {
    /// Create a limiter on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a limiter on an injected clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, WindowState>>> {
        self.windows
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".into()))
    }
}

impl Default for MockRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRateLimiter").finish_non_exhaustive()
    }
}

#[async_trait]
impl RateLimiter for MockRateLimiter {
    async fn check_and_record(&self, key: &str, policy: RateLimitPolicy) -> Result<RateLimitStatus> {
        let now = self.clock.now();
        let mut windows = self.lock()?;

        let (state, status) = FixedWindow::evaluate(windows.get(key).copied(), now, policy)?;
        windows.insert(key.to_string(), state);

        Ok(status)
    }

    async fn get_attempts(&self, key: &str, policy: RateLimitPolicy) -> Result<u32> {
        let now = self.clock.now();
        let windows = self.lock()?;

        match windows.get(key) {
            Some(state) if policy.is_open(state, now)? => Ok(state.count),
            _ => Ok(0),
        }
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
