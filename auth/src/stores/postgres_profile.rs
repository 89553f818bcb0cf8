//! `PostgreSQL` profile directory.
//!
//! Reads the BaaS-owned `profiles` and `subscriptions` tables.

use crate::error::{AuthError, Result};
use crate::providers::ProfileDirectory;
use async_trait::async_trait;
use campus_core::environment::{Clock, SystemClock};
use campus_core::{Role, UserId};
use sqlx::PgPool;
use std::sync::Arc;

/// `PostgreSQL`-backed [`ProfileDirectory`].
#[derive(Clone)]
pub struct PostgresProfileDirectory {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresProfileDirectory {
    /// Create a directory using the system clock.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Create a directory with an injected clock.
    #[must_use]
    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl ProfileDirectory for PostgresProfileDirectory {
    async fn role_of(&self, user_id: UserId) -> Result<Role> {
        let role: Option<Option<String>> =
            sqlx::query_scalar("SELECT role FROM profiles WHERE id = $1")
                .bind(*user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AuthError::DatabaseError(format!("Failed to load profile: {e}")))?;

        Ok(role.flatten().map_or_else(Role::default, |raw| Role::parse(&raw)))
    }

    async fn has_active_subscription(&self, user_id: UserId) -> Result<bool> {
        let active: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM subscriptions
                WHERE user_id = $1
                  AND status IN ('active', 'trialing')
                  AND (current_period_end IS NULL OR current_period_end > $2)
            )
            ",
        )
        .bind(*user_id.as_uuid())
        .bind(self.clock.now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Failed to load subscription: {e}")))?;

        Ok(active)
    }
}
