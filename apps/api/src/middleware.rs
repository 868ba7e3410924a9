use std::str::FromStr;

use axum::extract::{Extension, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use hectara_core::{AppError, RoleRef, TenantId, UserIdentity};
use hectara_domain::PermissionKey;
use tracing::error;

use crate::error::ApiResult;
use crate::state::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const SUBJECT_HEADER: &str = "x-subject";
pub const ROLE_HEADER: &str = "x-role";

/// Permission a guarded route requires, bundled with the state that checks it.
#[derive(Clone)]
pub struct PermissionGuard {
    pub state: AppState,
    pub key: PermissionKey,
}

/// Builds the caller identity from headers set by the trusted gateway.
pub async fn require_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers())?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Rejects the request unless the caller's role holds the guard's permission.
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    Extension(identity): Extension<UserIdentity>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    guard
        .state
        .authorization_service
        .require_permission(&identity, guard.key)
        .await
        .inspect_err(|app_error| {
            if matches!(app_error, AppError::ResolutionUnavailable(_)) {
                error!(
                    subject = identity.subject(),
                    role = %identity.role(),
                    permission = %guard.key,
                    error = %app_error,
                    "permission resolution failed"
                );
            }
        })?;

    Ok(next.run(request).await)
}

fn identity_from_headers(headers: &HeaderMap) -> Result<UserIdentity, AppError> {
    let tenant_id = TenantId::from_str(required_header(headers, TENANT_HEADER)?).map_err(
        |error| AppError::Unauthorized(format!("invalid {TENANT_HEADER} header: {error}")),
    )?;
    let subject = required_header(headers, SUBJECT_HEADER)?;
    let role = RoleRef::from_str(required_header(headers, ROLE_HEADER)?)
        .map_err(|error| AppError::Unauthorized(format!("invalid {ROLE_HEADER} header: {error}")))?;

    Ok(UserIdentity::new(subject, role, tenant_id))
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {name} header")))
}
