//! Error types for order placement.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for commerce operations.
pub type Result<T> = std::result::Result<T, CommerceError>;

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `shipping.email` or `items[1].quantity`
    pub field: String,
    /// Human readable reason
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure modes of order placement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// The request is malformed. Carries every offending field.
    #[error("Order request is invalid ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    /// An item cannot be bought at all (missing, inactive, sales closed).
    #[error("{item} is unavailable: {reason}")]
    Unavailable {
        /// Which item, e.g. `product 6f1c...`
        item: String,
        /// Why it is unavailable
        reason: String,
    },

    /// Not enough stock or tickets left.
    #[error("{item} is out of stock (requested {requested}, available {available})")]
    OutOfStock {
        /// Which item
        item: String,
        /// Quantity asked for
        requested: u32,
        /// Quantity left when checked
        available: u32,
    },

    /// The catalog showed enough stock, but the atomic reservation lost to
    /// a concurrent order.
    #[error("{item} sold out while reserving (requested {requested})")]
    SoldOutWhileReserving {
        /// Which item
        item: String,
        /// Quantity asked for
        requested: u32,
    },

    /// Catalog lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Membership lookup failed.
    #[error("Membership lookup failed: {0}")]
    Membership(String),

    /// Writing the order failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl CommerceError {
    /// Single-field validation error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Returns `true` if the caller can fix this by changing the request.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Unavailable { .. }
                | Self::OutOfStock { .. }
                | Self::SoldOutWhileReserving { .. }
        )
    }

    /// Short outcome label for metrics.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid",
            Self::Unavailable { .. } => "unavailable",
            Self::OutOfStock { .. } | Self::SoldOutWhileReserving { .. } => "out_of_stock",
            Self::Catalog(_) | Self::Membership(_) | Self::Persistence(_) => "error",
        }
    }
}

impl From<sqlx::Error> for CommerceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<campus_auth::AuthError> for CommerceError {
    fn from(err: campus_auth::AuthError) -> Self {
        Self::Membership(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_counts_fields() {
        let err = CommerceError::Validation(vec![
            FieldError::new("items", "must not be empty"),
            FieldError::new("shipping.email", "is not a valid email address"),
        ]);
        assert_eq!(err.to_string(), "Order request is invalid (2 field errors)");
    }

    #[test]
    fn test_user_errors() {
        assert!(CommerceError::invalid("items", "x").is_user_error());
        assert!(
            CommerceError::OutOfStock {
                item: "product p".into(),
                requested: 2,
                available: 1
            }
            .is_user_error()
        );
        assert!(
            CommerceError::SoldOutWhileReserving {
                item: "product p".into(),
                requested: 2
            }
            .is_user_error()
        );
        assert!(!CommerceError::Persistence("down".into()).is_user_error());
    }
}
