//! # Campus Core
//!
//! Domain primitives shared by every Campus service crate.
//!
//! This crate is deliberately dependency-light. It contains:
//!
//! - **Identifiers**: UUID newtypes for users, orders, catalog entries and attendees
//! - **Money**: integer minor units, never floating point
//! - **Role**: the platform roles stored on a user's profile
//! - **Environment**: the `Clock` trait so time-dependent logic stays testable
//!
//! ## Example
//!
//! ```
//! use campus_core::{Money, Role};
//!
//! let unit = Money::from_cents(1_250);
//! assert_eq!(unit.checked_times(3), Some(Money::from_cents(3_750)));
//! assert_eq!(Role::parse("Professor"), Role::Professor);
//! ```

pub mod ids;
pub mod money;
pub mod role;

pub use ids::{AttendeeId, EventId, OrderId, ProductId, TicketTypeId, UserId};
pub use money::Money;
pub use role::Role;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Environment module - Dependency injection traits
///
/// External facts a service depends on (currently only time) are abstracted
/// behind traits and injected, so tests can pin them.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use campus_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
