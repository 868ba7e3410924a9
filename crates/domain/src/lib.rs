//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod grant;
mod permission;
mod role;

pub use audit::AuditAction;
pub use grant::{GrantId, GrantQuery, GrantScope, RoleGrant};
pub use hectara_core::{CustomRoleId, RoleRef, SystemRole};
pub use permission::{Permission, PermissionAction, PermissionId, PermissionKey, ResourceType};
pub use role::{CUSTOM_ROLE_NAME_MAX_LENGTH, CustomRole, CustomRolePatch};
