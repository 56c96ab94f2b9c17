//! User accounts and role assignment reads.

use async_trait::async_trait;
use marquee_domain::{Capabilities, Role, RoleDirectory, StoreError, UserRecord};
use marquee_id::{EventId, UserId};
use sqlx::{postgres::PgPool, Row};

/// Postgres-backed [`RoleDirectory`].
#[derive(Clone)]
pub struct RoleStore {
    pool: PgPool,
}

impl RoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    StoreError::new(e.to_string())
}

#[async_trait]
impl RoleDirectory for RoleStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT email, is_verified, is_admin, is_super_admin FROM users WHERE id = $1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let email: String = row.try_get("email").map_err(store_error)?;
        let is_verified: bool = row.try_get("is_verified").map_err(store_error)?;
        let is_admin: bool = row.try_get("is_admin").map_err(store_error)?;
        let is_super_admin: bool = row.try_get("is_super_admin").map_err(store_error)?;

        Ok(Some(UserRecord {
            id: user_id,
            email,
            capabilities: Capabilities::from_flags(is_verified, is_admin, is_super_admin),
        }))
    }

    async fn holds_any(
        &self,
        user_id: UserId,
        event_id: EventId,
        roles: &[Role],
    ) -> Result<bool, StoreError> {
        let role_names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM role_assignments
                WHERE user_id = $1 AND event_id = $2 AND role = ANY($3)
            ) AS held
            "#,
        )
        .bind(user_id.to_string())
        .bind(event_id.to_string())
        .bind(role_names)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        row.try_get("held").map_err(store_error)
    }
}
