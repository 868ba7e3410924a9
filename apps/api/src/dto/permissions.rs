use hectara_domain::{Permission, PermissionKey};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a catalog permission.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "permission-response.ts")]
pub struct PermissionResponse {
    pub permission_id: String,
    pub resource_type: String,
    pub action: String,
    pub key: String,
    pub description: String,
}

impl From<Permission> for PermissionResponse {
    fn from(value: Permission) -> Self {
        let key = value.key();
        Self {
            permission_id: value.id().to_string(),
            resource_type: key.resource_type.as_str().to_owned(),
            action: key.action.as_str().to_owned(),
            key: key.to_string(),
            description: value.description().to_owned(),
        }
    }
}

/// Incoming payload for registering a catalog permission.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "register-permission-request.ts")]
pub struct RegisterPermissionRequest {
    pub resource_type: String,
    pub action: String,
    pub description: String,
}

/// Incoming payload for permission description updates.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "update-permission-description-request.ts")]
pub struct UpdatePermissionDescriptionRequest {
    pub description: String,
}

/// Incoming payload for an ad-hoc permission check of the caller.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "check-permission-request.ts")]
pub struct CheckPermissionRequest {
    pub resource_type: String,
    pub action: String,
}

/// Result of an ad-hoc permission check.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "check-permission-response.ts")]
pub struct CheckPermissionResponse {
    pub allowed: bool,
}

/// Permissions the caller's role holds in the caller's tenant.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "effective-permissions-response.ts")]
pub struct EffectivePermissionsResponse {
    pub role: String,
    pub tenant_id: String,
    pub permissions: Vec<String>,
}

impl EffectivePermissionsResponse {
    pub fn new(role: String, tenant_id: String, keys: Vec<PermissionKey>) -> Self {
        Self {
            role,
            tenant_id,
            permissions: keys.iter().map(PermissionKey::to_string).collect(),
        }
    }
}
