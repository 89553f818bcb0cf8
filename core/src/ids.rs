//! Strongly typed identifiers.
//!
//! Every record the services touch is keyed by a UUID in the hosted
//! database. Wrapping them keeps a product id from being passed where a
//! ticket type id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an authenticated platform user (the BaaS auth user id)
    UserId
);
uuid_id!(
    /// Identifier of a shop/ticket order
    OrderId
);
uuid_id!(
    /// Identifier of a merchandise product
    ProductId
);
uuid_id!(
    /// Identifier of a ticket type (price tier) for an event
    TicketTypeId
);
uuid_id!(
    /// Identifier of a ticketed event
    EventId
);
uuid_id!(
    /// Identifier of an event attendee record
    AttendeeId
);
