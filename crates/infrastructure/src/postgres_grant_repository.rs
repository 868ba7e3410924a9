use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use hectara_application::GrantRepository;
use hectara_core::{AppError, AppResult, CustomRoleId, RoleRef, SystemRole, TenantId};
use hectara_domain::{GrantId, GrantQuery, GrantScope, PermissionId, RoleGrant};

use crate::postgres_error::{
    is_foreign_key_violation, is_unique_violation, map_store_error, violated_constraint,
};

#[cfg(test)]
mod tests;

const CUSTOM_ROLE_FOREIGN_KEY: &str = "rbac_role_permissions_custom_role_id_fkey";

/// PostgreSQL-backed grant store for system and custom roles.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    id: Uuid,
    system_role: Option<String>,
    custom_role_id: Option<Uuid>,
    permission_id: Uuid,
    tenant_id: Option<Uuid>,
}

impl TryFrom<GrantRow> for RoleGrant {
    type Error = AppError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let role = match (row.system_role, row.custom_role_id) {
            (Some(system_role), None) => {
                RoleRef::System(system_role.parse::<SystemRole>().map_err(|error| {
                    AppError::Internal(format!("failed to decode grant '{}': {error}", row.id))
                })?)
            }
            (None, Some(custom_role_id)) => RoleRef::Custom(CustomRoleId::from_uuid(custom_role_id)),
            _ => {
                return Err(AppError::Internal(format!(
                    "grant '{}' must reference exactly one role",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: GrantId::from_uuid(row.id),
            role,
            permission_id: PermissionId::from_uuid(row.permission_id),
            scope: GrantScope::from_tenant(row.tenant_id.map(TenantId::from_uuid)),
        })
    }
}

fn role_column(role: RoleRef) -> &'static str {
    match role {
        RoleRef::System(_) => "system_role",
        RoleRef::Custom(_) => "custom_role_id",
    }
}

/// Deletes every grant row of a custom role inside the caller's transaction.
pub(crate) async fn delete_custom_role_grants(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: CustomRoleId,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM rbac_role_permissions
        WHERE custom_role_id = $1
        "#,
    )
    .bind(role_id.as_uuid())
    .execute(&mut **transaction)
    .await?;

    Ok(result.rows_affected())
}

/// Serializes replacements of one (role, scope) pair until the transaction ends.
async fn lock_grant_scope(
    transaction: &mut Transaction<'_, Postgres>,
    role: RoleRef,
    scope: GrantScope,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("rbac_role_permissions:{role}@{scope}"))
        .execute(&mut **transaction)
        .await?;

    Ok(())
}

fn scope_predicate(query: GrantQuery) -> &'static str {
    match query {
        GrantQuery::GlobalOnly => "tenant_id IS NULL",
        GrantQuery::AllScopes => "TRUE",
        GrantQuery::EffectiveFor(_) => "(tenant_id IS NULL OR tenant_id = $2)",
    }
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn find_grants(&self, role: RoleRef, query: GrantQuery) -> AppResult<Vec<RoleGrant>> {
        let statement = format!(
            r#"
            SELECT id, system_role, custom_role_id, permission_id, tenant_id
            FROM rbac_role_permissions
            WHERE {} = $1 AND {}
            ORDER BY tenant_id NULLS FIRST, created_at, id
            "#,
            role_column(role),
            scope_predicate(query),
        );

        let mut grants_query = match role {
            RoleRef::System(system_role) => {
                sqlx::query_as::<_, GrantRow>(statement.as_str()).bind(system_role.as_str())
            }
            RoleRef::Custom(role_id) => {
                sqlx::query_as::<_, GrantRow>(statement.as_str()).bind(role_id.as_uuid())
            }
        };
        if let GrantQuery::EffectiveFor(tenant_id) = query {
            grants_query = grants_query.bind(tenant_id.as_uuid());
        }

        let rows = grants_query
            .fetch_all(&self.pool)
            .await
            .map_err(|error| map_store_error(error, &format!("failed to load grants of '{role}'")))?;

        rows.into_iter().map(RoleGrant::try_from).collect()
    }

    async fn replace_grants(
        &self,
        role: RoleRef,
        scope: GrantScope,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<RoleGrant>> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        // Held until commit: replaces of the same scope never interleave.
        lock_grant_scope(&mut transaction, role, scope)
            .await
            .map_err(|error| map_store_error(error, "failed to lock grant scope"))?;

        let delete_statement = format!(
            r#"
            DELETE FROM rbac_role_permissions
            WHERE {} = $1 AND tenant_id IS NOT DISTINCT FROM $2
            "#,
            role_column(role),
        );
        let delete_query = match role {
            RoleRef::System(system_role) => {
                sqlx::query(delete_statement.as_str()).bind(system_role.as_str())
            }
            RoleRef::Custom(role_id) => sqlx::query(delete_statement.as_str()).bind(role_id.as_uuid()),
        };
        delete_query
            .bind(scope.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to clear scoped grants"))?;

        let mut grants = Vec::with_capacity(permission_ids.len());
        for permission_id in permission_ids {
            let grant = RoleGrant::new(role, *permission_id, scope);

            sqlx::query(
                r#"
                INSERT INTO rbac_role_permissions (
                    id,
                    system_role,
                    custom_role_id,
                    permission_id,
                    tenant_id
                )
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(grant.id.as_uuid())
            .bind(role.system_role().map(|system_role| system_role.as_str()))
            .bind(role.custom_role_id().map(|role_id| role_id.as_uuid()))
            .bind(permission_id.as_uuid())
            .bind(scope.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    return match (violated_constraint(&error), role) {
                        (Some(CUSTOM_ROLE_FOREIGN_KEY), RoleRef::Custom(role_id)) => {
                            AppError::RoleNotFound(role_id.to_string())
                        }
                        _ => AppError::UnknownPermission(permission_id.to_string()),
                    };
                }
                if is_unique_violation(&error) {
                    return AppError::Validation(format!(
                        "permission '{permission_id}' is listed more than once"
                    ));
                }

                map_store_error(error, "failed to insert grant")
            })?;

            grants.push(grant);
        }

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit grant replacement"))?;

        Ok(grants)
    }

    async fn delete_grants_for_role(&self, role_id: CustomRoleId) -> AppResult<u64> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        let removed = delete_custom_role_grants(&mut transaction, role_id)
            .await
            .map_err(|error| map_store_error(error, "failed to delete custom role grants"))?;

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit grant deletion"))?;

        Ok(removed)
    }
}
