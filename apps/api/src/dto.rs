mod common;
mod permissions;
mod roles;

pub use common::HealthResponse;
pub use permissions::{
    CheckPermissionRequest, CheckPermissionResponse, EffectivePermissionsResponse,
    PermissionResponse, RegisterPermissionRequest, UpdatePermissionDescriptionRequest,
};
pub use roles::{
    CreateRoleRequest, GrantListQuery, ReplaceRolePermissionsRequest, RoleGrantResponse,
    RoleResponse, RoleStatsResponse, UpdateRoleRequest,
};
