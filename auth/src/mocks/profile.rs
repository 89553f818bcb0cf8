//! Mock profile directory for testing.

use crate::error::{AuthError, Result};
use crate::providers::ProfileDirectory;
use async_trait::async_trait;
use campus_core::{Role, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// In-memory roles and memberships.
#[derive(Debug, Clone, Default)]
pub struct MockProfileDirectory {
    roles: Arc<RwLock<HashMap<UserId, Role>>>,
    members: Arc<RwLock<HashSet<UserId>>>,
}

impl MockProfileDirectory {
    /// Create an empty directory (everyone is a non-member student).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a role for `user_id`.
    pub fn set_role(&self, user_id: UserId, role: Role) {
        if let Ok(mut roles) = self.roles.write() {
            roles.insert(user_id, role);
        }
    }

    /// Grant or revoke an active subscription.
    pub fn set_member(&self, user_id: UserId, member: bool) {
        if let Ok(mut members) = self.members.write() {
            if member {
                members.insert(user_id);
            } else {
                members.remove(&user_id);
            }
        }
    }
}

#[async_trait]
impl ProfileDirectory for MockProfileDirectory {
    async fn role_of(&self, user_id: UserId) -> Result<Role> {
        let roles = self
            .roles
            .read()
            .map_err(|_| AuthError::InternalError("Lock poisoned".into()))?;
        Ok(roles.get(&user_id).copied().unwrap_or_default())
    }

    async fn has_active_subscription(&self, user_id: UserId) -> Result<bool> {
        let members = self
            .members
            .read()
            .map_err(|_| AuthError::InternalError("Lock poisoned".into()))?;
        Ok(members.contains(&user_id))
    }
}
