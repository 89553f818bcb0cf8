//! The authenticated caller of a request.

use crate::error::{AuthError, Result};
use campus_core::{Role, UserId};
use serde::{Deserialize, Serialize};

/// An authenticated user, as resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Auth user id (also the profile primary key)
    pub user_id: UserId,
    /// Email reported by the identity provider, if any
    pub email: Option<String>,
    /// Role from the caller's profile
    pub role: Role,
}

impl Caller {
    /// Create a caller.
    #[must_use]
    pub const fn new(user_id: UserId, email: Option<String>, role: Role) -> Self {
        Self {
            user_id,
            email,
            role,
        }
    }

    /// Whether the caller holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Require the caller to hold one of `roles`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InsufficientPermissions` listing the accepted roles.
    pub fn require_any_role(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.role) {
            return Ok(());
        }

        let required = roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(" or ");

        tracing::warn!(
            user_id = %self.user_id,
            role = %self.role,
            required = %required,
            "Role check failed"
        );

        Err(AuthError::InsufficientPermissions { required })
    }
}
