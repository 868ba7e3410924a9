//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod authorization_service;
mod permission_catalog_service;
mod role_lifecycle_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    AuditEvent, AuditRepository, CacheGeneration, CreateCustomRoleInput, CustomRoleRepository,
    GrantRepository, PermissionCatalogRepository, PermissionResolutionCache,
    ResolvedPermissionSet, RoleStats, RoleSummary, UserDirectory,
};
pub use authorization_service::AuthorizationService;
pub use permission_catalog_service::PermissionCatalogService;
pub use role_lifecycle_service::{RoleLifecycleDependencies, RoleLifecycleService};
