use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use hectara_application::CustomRoleRepository;
use hectara_core::{AppError, AppResult, CustomRoleId};
use hectara_domain::CustomRole;

use crate::postgres_error::{is_foreign_key_violation, is_unique_violation, map_store_error};
use crate::postgres_grant_repository::delete_custom_role_grants;

/// PostgreSQL-backed custom role catalog.
#[derive(Clone)]
pub struct PostgresCustomRoleRepository {
    pool: PgPool,
}

impl PostgresCustomRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CustomRoleRow {
    id: Uuid,
    name: String,
    display_name: String,
    description: Option<String>,
    is_system: bool,
    can_be_deleted: bool,
}

impl TryFrom<CustomRoleRow> for CustomRole {
    type Error = AppError;

    fn try_from(row: CustomRoleRow) -> Result<Self, Self::Error> {
        CustomRole::from_stored(
            CustomRoleId::from_uuid(row.id),
            row.name,
            row.display_name,
            row.description,
            row.is_system,
            row.can_be_deleted,
        )
        .map_err(|error| {
            AppError::Internal(format!("failed to decode custom role '{}': {error}", row.id))
        })
    }
}

#[async_trait]
impl CustomRoleRepository for PostgresCustomRoleRepository {
    async fn list_custom_roles(&self) -> AppResult<Vec<CustomRole>> {
        let rows = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT id, name, display_name, description, is_system, can_be_deleted
            FROM rbac_custom_roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to list custom roles"))?;

        rows.into_iter().map(CustomRole::try_from).collect()
    }

    async fn find_custom_role(&self, role_id: CustomRoleId) -> AppResult<Option<CustomRole>> {
        let row = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT id, name, display_name, description, is_system, can_be_deleted
            FROM rbac_custom_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to find custom role"))?;

        row.map(CustomRole::try_from).transpose()
    }

    async fn find_custom_role_by_name(&self, name: &str) -> AppResult<Option<CustomRole>> {
        let row = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT id, name, display_name, description, is_system, can_be_deleted
            FROM rbac_custom_roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to find custom role by name"))?;

        row.map(CustomRole::try_from).transpose()
    }

    async fn insert_custom_role(&self, role: CustomRole) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_custom_roles (
                id,
                name,
                display_name,
                description,
                is_system,
                can_be_deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name().as_str())
        .bind(role.display_name().as_str())
        .bind(role.description())
        .bind(role.is_system())
        .bind(role.can_be_deleted())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::RoleAlreadyExists(role.name().as_str().to_owned());
            }

            map_store_error(error, "failed to insert custom role")
        })?;

        Ok(())
    }

    async fn update_custom_role(&self, role: CustomRole) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE rbac_custom_roles
            SET display_name = $2, description = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.display_name().as_str())
        .bind(role.description())
        .execute(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to update custom role"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::RoleNotFound(role.id().to_string()));
        }

        Ok(())
    }

    async fn delete_custom_role(&self, role_id: CustomRoleId) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        let removed_grants = delete_custom_role_grants(&mut transaction, role_id)
            .await
            .map_err(|error| map_store_error(error, "failed to delete custom role grants"))?;

        // users.custom_role_id is ON DELETE RESTRICT, so an assignment that
        // raced the deletion guard aborts the whole transaction here.
        let deleted = sqlx::query(
            r#"
            DELETE FROM rbac_custom_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                return AppError::Conflict(format!(
                    "role '{role_id}' was assigned to a user during deletion"
                ));
            }

            map_store_error(error, "failed to delete custom role")
        })?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::RoleNotFound(role_id.to_string()));
        }

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit custom role deletion"))?;

        debug!(%role_id, removed_grants, "custom role row deleted");
        Ok(())
    }
}
