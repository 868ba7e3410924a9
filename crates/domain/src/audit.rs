use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by access-control use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a custom role is renamed or re-described.
    RoleUpdated,
    /// Emitted when a custom role and its grants are deleted.
    RoleDeleted,
    /// Emitted when the grant set of a role is replaced for one scope.
    RolePermissionsReplaced,
    /// Emitted when a permission is registered in the catalog.
    PermissionRegistered,
    /// Emitted when a permission description changes.
    PermissionDescriptionUpdated,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "rbac.role.created",
            Self::RoleUpdated => "rbac.role.updated",
            Self::RoleDeleted => "rbac.role.deleted",
            Self::RolePermissionsReplaced => "rbac.role.permissions_replaced",
            Self::PermissionRegistered => "rbac.permission.registered",
            Self::PermissionDescriptionUpdated => "rbac.permission.description_updated",
        }
    }
}
