use async_trait::async_trait;
use sqlx::PgPool;

use hectara_application::UserDirectory;
use hectara_core::{AppResult, CustomRoleId};

use crate::postgres_error::map_store_error;

/// PostgreSQL-backed read model over the `users` projection.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn count_users_with_role(&self, role_id: CustomRoleId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE custom_role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to count users with role"))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
