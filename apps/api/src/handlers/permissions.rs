use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use hectara_core::UserIdentity;
use hectara_domain::{PermissionId, PermissionKey};

use crate::dto::{
    CheckPermissionRequest, CheckPermissionResponse, EffectivePermissionsResponse,
    PermissionResponse, RegisterPermissionRequest, UpdatePermissionDescriptionRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .permission_catalog_service
        .list_permissions()
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn register_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RegisterPermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let key = PermissionKey::parse(payload.resource_type.as_str(), payload.action.as_str())?;
    let permission = state
        .permission_catalog_service
        .register_permission(&user, key, payload.description.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(permission))))
}

pub async fn update_permission_description_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(permission_id): Path<String>,
    Json(payload): Json<UpdatePermissionDescriptionRequest>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission_id = PermissionId::from_str(permission_id.as_str())?;
    let permission = state
        .permission_catalog_service
        .update_description(&user, permission_id, payload.description.as_str())
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

/// Checks a raw (resource type, action) pair for the caller.
///
/// Unknown tags answer `allowed: false` rather than an error.
pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CheckPermissionRequest>,
) -> ApiResult<Json<CheckPermissionResponse>> {
    let allowed = state
        .authorization_service
        .has_permission(
            user.role(),
            payload.resource_type.as_str(),
            payload.action.as_str(),
            user.tenant_id(),
        )
        .await?;

    Ok(Json(CheckPermissionResponse { allowed }))
}

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let keys = state
        .authorization_service
        .effective_permissions(user.role(), user.tenant_id())
        .await?;

    Ok(Json(EffectivePermissionsResponse::new(
        user.role().to_string(),
        user.tenant_id().to_string(),
        keys,
    )))
}
