use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use hectara_application::PermissionCatalogRepository;
use hectara_core::{AppError, AppResult};
use hectara_domain::{Permission, PermissionId, PermissionKey};

use crate::postgres_error::{is_unique_violation, map_store_error};

/// PostgreSQL-backed permission catalog.
#[derive(Clone)]
pub struct PostgresPermissionCatalogRepository {
    pool: PgPool,
}

impl PostgresPermissionCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    resource_type: String,
    action: String,
    description: String,
}

impl TryFrom<PermissionRow> for Permission {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        let key = PermissionKey::parse(row.resource_type.as_str(), row.action.as_str()).map_err(
            |error| {
                AppError::Internal(format!(
                    "failed to decode permission '{}': {error}",
                    row.id
                ))
            },
        )?;

        Permission::from_stored(PermissionId::from_uuid(row.id), key, row.description)
    }
}

#[async_trait]
impl PermissionCatalogRepository for PostgresPermissionCatalogRepository {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, resource_type, action, description
            FROM rbac_permissions
            ORDER BY resource_type, action
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to list permissions"))?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    async fn find_permission_by_key(&self, key: PermissionKey) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, resource_type, action, description
            FROM rbac_permissions
            WHERE resource_type = $1 AND action = $2
            "#,
        )
        .bind(key.resource_type.as_str())
        .bind(key.action.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to find permission"))?;

        row.map(Permission::try_from).transpose()
    }

    async fn find_permissions_by_ids(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>> {
        let ids = permission_ids
            .iter()
            .map(PermissionId::as_uuid)
            .collect::<Vec<_>>();

        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, resource_type, action, description
            FROM rbac_permissions
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to load permissions by id"))?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let key = permission.key();

        sqlx::query(
            r#"
            INSERT INTO rbac_permissions (id, resource_type, action, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(permission.id().as_uuid())
        .bind(key.resource_type.as_str())
        .bind(key.action.as_str())
        .bind(permission.description())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::DuplicatePermission {
                    resource_type: key.resource_type.as_str().to_owned(),
                    action: key.action.as_str().to_owned(),
                };
            }

            map_store_error(error, "failed to insert permission")
        })?;

        Ok(())
    }

    async fn update_permission_description(
        &self,
        permission_id: PermissionId,
        description: &str,
    ) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            UPDATE rbac_permissions
            SET description = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, resource_type, action, description
            "#,
        )
        .bind(permission_id.as_uuid())
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to update permission description"))?;

        row.map(Permission::try_from)
            .transpose()?
            .ok_or_else(|| AppError::UnknownPermission(permission_id.to_string()))
    }
}
