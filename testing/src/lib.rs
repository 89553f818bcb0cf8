//! # Campus Testing
//!
//! Testing utilities shared by the Campus service crates.
//!
//! This crate provides:
//! - Deterministic `Clock` implementations (`FixedClock`, `ManualClock`)
//! - A one-line tracing setup for tests that want log output
//!
//! Provider mocks live next to their traits (`campus_auth::mocks`,
//! `campus_commerce::mocks`, `campus_media::mocks`).
//!
//! ## Example
//!
//! ```
//! use campus_testing::{ManualClock, test_clock};
//! use campus_core::environment::Clock;
//! use chrono::Duration;
//!
//! let clock = ManualClock::starting_at(test_clock().now());
//! let start = clock.now();
//! clock.advance(Duration::seconds(30));
//! assert_eq!(clock.now() - start, Duration::seconds(30));
//! ```

use campus_core::environment::Clock;
use chrono::{DateTime, Utc};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use campus_testing::mocks::FixedClock;
    /// use campus_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when a test advances it.
    ///
    /// Clones share the same underlying time, so a test can keep one handle
    /// and give another to the code under test.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a manual clock starting at `time`.
        #[must_use]
        pub fn starting_at(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: chrono::Duration) {
            if let Ok(mut guard) = self.time.write() {
                *guard += by;
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.read().map_or_else(|poisoned| *poisoned.into_inner(), |guard| *guard)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a `fmt` tracing subscriber writing to the test harness.
///
/// Safe to call from many tests; only the first call installs the subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(test_clock().now());
        let handle = clock.clone();

        handle.advance(Duration::minutes(5));

        assert_eq!(clock.now(), test_clock().now() + Duration::minutes(5));
    }

    #[test]
    fn test_manual_clock_advances_cumulatively() {
        let clock = ManualClock::starting_at(test_clock().now());
        clock.advance(Duration::hours(20));
        clock.advance(Duration::hours(4));
        assert_eq!(clock.now(), test_clock().now() + Duration::days(1));
    }
}
