use hectara_application::{RoleStats, RoleSummary};
use hectara_domain::{CustomRole, RoleGrant};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a system or custom role.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "role-response.ts")]
pub struct RoleResponse {
    pub role: String,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub can_be_deleted: bool,
}

impl From<RoleSummary> for RoleResponse {
    fn from(value: RoleSummary) -> Self {
        Self {
            role: value.role.to_string(),
            name: value.name,
            display_name: value.display_name,
            description: value.description,
            is_system: value.is_system,
            can_be_deleted: value.can_be_deleted,
        }
    }
}

impl From<CustomRole> for RoleResponse {
    fn from(value: CustomRole) -> Self {
        Self::from(RoleSummary::from(value))
    }
}

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "create-role-request.ts")]
pub struct CreateRoleRequest {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// Incoming payload for partial custom role updates.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "update-role-request.ts")]
pub struct UpdateRoleRequest {
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// Deletion-safety projection of a custom role.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "role-stats-response.ts")]
pub struct RoleStatsResponse {
    pub role_id: String,
    pub assigned_users: u64,
    pub can_delete: bool,
    pub reason: Option<String>,
}

impl From<RoleStats> for RoleStatsResponse {
    fn from(value: RoleStats) -> Self {
        Self {
            role_id: value.role_id.to_string(),
            assigned_users: value.assigned_users,
            can_delete: value.can_delete,
            reason: value.reason,
        }
    }
}

/// Scope selector for grant listings.
///
/// `scope` is one of `effective` (default), `global` or `all`.
#[derive(Debug, Default, Deserialize)]
pub struct GrantListQuery {
    pub scope: Option<String>,
    pub tenant_id: Option<String>,
}

/// Incoming payload for replacing the grants of one scope.
///
/// A missing `tenant_id` targets the global scope.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "replace-role-permissions-request.ts")]
pub struct ReplaceRolePermissionsRequest {
    pub tenant_id: Option<String>,
    pub permission_ids: Vec<String>,
}

/// API representation of one role grant.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "role-grant-response.ts")]
pub struct RoleGrantResponse {
    pub grant_id: String,
    pub role: String,
    pub permission_id: String,
    pub tenant_id: Option<String>,
}

impl From<RoleGrant> for RoleGrantResponse {
    fn from(value: RoleGrant) -> Self {
        Self {
            grant_id: value.id.to_string(),
            role: value.role.to_string(),
            permission_id: value.permission_id.to_string(),
            tenant_id: value.scope.tenant_id().map(|tenant_id| tenant_id.to_string()),
        }
    }
}
