use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use hectara_core::{AppError, CustomRoleId, RoleRef, SystemRole, TenantId, UserIdentity};
use hectara_domain::{GrantQuery, GrantScope, PermissionId, RoleGrant};

use crate::dto::{GrantListQuery, ReplaceRolePermissionsRequest, RoleGrantResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_system_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role): Path<String>,
    Query(query): Query<GrantListQuery>,
) -> ApiResult<Json<Vec<RoleGrantResponse>>> {
    let role = SystemRole::from_str(role.as_str())?;
    let grants = state
        .role_lifecycle_service
        .role_permissions(role, grant_query(&user, query)?)
        .await?;

    Ok(Json(grant_responses(grants)))
}

pub async fn replace_system_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role): Path<String>,
    Json(payload): Json<ReplaceRolePermissionsRequest>,
) -> ApiResult<Json<Vec<RoleGrantResponse>>> {
    let role = SystemRole::from_str(role.as_str())?;
    let scope = target_scope(&user, payload.tenant_id.as_deref())?;
    let permission_ids = parse_permission_ids(&payload.permission_ids)?;

    let grants = state
        .role_lifecycle_service
        .update_role_permissions(&user, role, scope, &permission_ids)
        .await?;

    Ok(Json(grant_responses(grants)))
}

pub async fn list_custom_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Query(query): Query<GrantListQuery>,
) -> ApiResult<Json<Vec<RoleGrantResponse>>> {
    let role_id = CustomRoleId::from_str(role_id.as_str())?;
    let grants = state
        .role_lifecycle_service
        .custom_role_permissions(role_id, grant_query(&user, query)?)
        .await?;

    Ok(Json(grant_responses(grants)))
}

pub async fn replace_custom_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<ReplaceRolePermissionsRequest>,
) -> ApiResult<Json<Vec<RoleGrantResponse>>> {
    let role_id = CustomRoleId::from_str(role_id.as_str())?;
    let scope = target_scope(&user, payload.tenant_id.as_deref())?;
    let permission_ids = parse_permission_ids(&payload.permission_ids)?;

    let grants = state
        .role_lifecycle_service
        .update_custom_role_permissions(&user, role_id, scope, &permission_ids)
        .await?;

    Ok(Json(grant_responses(grants)))
}

fn is_super_admin(user: &UserIdentity) -> bool {
    user.role() == RoleRef::System(SystemRole::SuperAdmin)
}

/// Resolves the scope a replacement targets.
///
/// Only super administrators may touch the global scope or another tenant.
fn target_scope(user: &UserIdentity, tenant_id: Option<&str>) -> Result<GrantScope, AppError> {
    let scope = match tenant_id {
        Some(value) => GrantScope::Tenant(TenantId::from_str(value)?),
        None => GrantScope::Global,
    };

    if !is_super_admin(user) && scope != GrantScope::Tenant(user.tenant_id()) {
        return Err(AppError::Forbidden(format!(
            "subject '{}' may only change grants of tenant '{}'",
            user.subject(),
            user.tenant_id()
        )));
    }

    Ok(scope)
}

fn grant_query(user: &UserIdentity, query: GrantListQuery) -> Result<GrantQuery, AppError> {
    let tenant_id = query
        .tenant_id
        .as_deref()
        .map(TenantId::from_str)
        .transpose()?
        .unwrap_or(user.tenant_id());

    let grant_query = match query.scope.as_deref().unwrap_or("effective") {
        "effective" => GrantQuery::EffectiveFor(tenant_id),
        "global" => GrantQuery::GlobalOnly,
        "all" => GrantQuery::AllScopes,
        other => {
            return Err(AppError::Validation(format!(
                "scope must be 'effective', 'global' or 'all', got '{other}'"
            )));
        }
    };

    let crosses_tenants = match grant_query {
        GrantQuery::EffectiveFor(tenant_id) => tenant_id != user.tenant_id(),
        GrantQuery::AllScopes => true,
        GrantQuery::GlobalOnly => false,
    };
    if crosses_tenants && !is_super_admin(user) {
        return Err(AppError::Forbidden(format!(
            "subject '{}' may only list grants of tenant '{}'",
            user.subject(),
            user.tenant_id()
        )));
    }

    Ok(grant_query)
}

fn parse_permission_ids(values: &[String]) -> Result<Vec<PermissionId>, AppError> {
    values
        .iter()
        .map(|value| PermissionId::from_str(value.as_str()))
        .collect()
}

fn grant_responses(grants: Vec<RoleGrant>) -> Vec<RoleGrantResponse> {
    grants.into_iter().map(RoleGrantResponse::from).collect()
}
