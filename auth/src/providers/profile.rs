//! Profile directory trait.

use crate::error::Result;
use async_trait::async_trait;
use campus_core::{Role, UserId};

/// Query-only access to user profiles and subscriptions.
///
/// The rows are owned by the BaaS schema; this layer never writes them.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Role stored on the user's profile.
    ///
    /// A user without a profile row is a [`Role::Student`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DatabaseError` if the lookup fails.
    async fn role_of(&self, user_id: UserId) -> Result<Role>;

    /// Whether the user currently holds an active platform subscription.
    ///
    /// Members get the member price tier at checkout.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DatabaseError` if the lookup fails.
    async fn has_active_subscription(&self, user_id: UserId) -> Result<bool>;
}
