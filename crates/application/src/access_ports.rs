mod audit;
mod cache;
mod catalog;
mod grants;
mod roles;
mod users;

pub use audit::{AuditEvent, AuditRepository};
pub use cache::{CacheGeneration, PermissionResolutionCache, ResolvedPermissionSet};
pub use catalog::PermissionCatalogRepository;
pub use grants::GrantRepository;
pub use roles::{CreateCustomRoleInput, CustomRoleRepository, RoleStats, RoleSummary};
pub use users::UserDirectory;
