use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use hectara_application::CreateCustomRoleInput;
use hectara_core::{CustomRoleId, UserIdentity};
use hectara_domain::CustomRolePatch;

use crate::dto::{CreateRoleRequest, RoleResponse, RoleStatsResponse, UpdateRoleRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_lifecycle_service
        .list_roles()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .role_lifecycle_service
        .create_role(
            &user,
            CreateCustomRoleInput {
                name: payload.name,
                display_name: payload.display_name,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role_id = CustomRoleId::from_str(role_id.as_str())?;
    let role = state.role_lifecycle_service.find_role(role_id).await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role_id = CustomRoleId::from_str(role_id.as_str())?;
    let role = state
        .role_lifecycle_service
        .update_role(
            &user,
            role_id,
            CustomRolePatch {
                display_name: payload.display_name,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    let role_id = CustomRoleId::from_str(role_id.as_str())?;
    state
        .role_lifecycle_service
        .delete_role(&user, role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn role_stats_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleStatsResponse>> {
    let role_id = CustomRoleId::from_str(role_id.as_str())?;
    let stats = state.role_lifecycle_service.role_stats(role_id).await?;

    Ok(Json(RoleStatsResponse::from(stats)))
}
