//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_access_repository;
mod in_memory_permission_resolution_cache;
mod postgres_audit_repository;
mod postgres_custom_role_repository;
mod postgres_error;
mod postgres_grant_repository;
mod postgres_permission_catalog_repository;
mod postgres_user_directory;

pub use in_memory_access_repository::InMemoryAccessRepository;
pub use in_memory_permission_resolution_cache::InMemoryPermissionResolutionCache;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_custom_role_repository::PostgresCustomRoleRepository;
pub use postgres_grant_repository::PostgresGrantRepository;
pub use postgres_permission_catalog_repository::PostgresPermissionCatalogRepository;
pub use postgres_user_directory::PostgresUserDirectory;
