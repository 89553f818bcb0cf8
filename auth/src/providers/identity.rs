//! Identity provider trait.

use crate::caller::Caller;
use crate::error::Result;
use async_trait::async_trait;

/// Resolves a bearer token into an authenticated [`Caller`].
///
/// # Example
///
/// ```no_run
/// use campus_auth::providers::IdentityProvider;
///
/// # async fn example(identity: &dyn IdentityProvider) -> Result<(), Box<dyn std::error::Error>> {
/// let caller = identity.authenticate("eyJhbGciOi...").await?;
/// println!("{} is a {}", caller.user_id, caller.role);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify `token` and load the caller's role.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` - token rejected or expired
    /// - `AuthError::ProviderUnavailable` - identity service unreachable
    /// - `AuthError::DatabaseError` - profile lookup failed
    async fn authenticate(&self, token: &str) -> Result<Caller>;
}
