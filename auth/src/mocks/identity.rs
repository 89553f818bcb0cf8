//! Mock identity provider for testing.

use crate::caller::Caller;
use crate::error::{AuthError, Result};
use crate::providers::IdentityProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Token table mapping bearer tokens to callers.
///
/// Unknown tokens are `InvalidToken`. [`MockIdentityProvider::set_unavailable`]
/// simulates an outage of the identity service.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    tokens: Arc<RwLock<HashMap<String, Caller>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl MockIdentityProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as belonging to `caller`.
    #[must_use]
    pub fn with_token(self, token: impl Into<String>, caller: Caller) -> Self {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), caller);
        }
        self
    }

    /// Make every call fail with `ProviderUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut flag) = self.unavailable.write() {
            *flag = unavailable;
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn authenticate(&self, token: &str) -> Result<Caller> {
        if self.unavailable.read().is_ok_and(|flag| *flag) {
            return Err(AuthError::ProviderUnavailable("mock outage".into()));
        }

        let tokens = self
            .tokens
            .read()
            .map_err(|_| AuthError::InternalError("Lock poisoned".into()))?;

        tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}
