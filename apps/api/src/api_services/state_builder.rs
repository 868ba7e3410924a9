use std::sync::Arc;

use hectara_application::{
    AuditRepository, AuthorizationService, CustomRoleRepository, GrantRepository,
    PermissionCatalogRepository, PermissionCatalogService, PermissionResolutionCache,
    RoleLifecycleDependencies, RoleLifecycleService, UserDirectory,
};
use hectara_infrastructure::{
    InMemoryPermissionResolutionCache, PostgresAuditRepository, PostgresCustomRoleRepository,
    PostgresGrantRepository, PostgresPermissionCatalogRepository, PostgresUserDirectory,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Port implementations the services are wired from.
pub struct AccessAdapters {
    pub catalog: Arc<dyn PermissionCatalogRepository>,
    pub roles: Arc<dyn CustomRoleRepository>,
    pub grants: Arc<dyn GrantRepository>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub audit_repository: Arc<dyn AuditRepository>,
    pub cache: Arc<dyn PermissionResolutionCache>,
}

pub fn build_postgres_adapters(pool: &PgPool, config: &ApiConfig) -> AccessAdapters {
    let cache = match config.permission_cache_ttl {
        Some(ttl) => InMemoryPermissionResolutionCache::with_ttl(ttl),
        None => InMemoryPermissionResolutionCache::new(),
    };

    AccessAdapters {
        catalog: Arc::new(PostgresPermissionCatalogRepository::new(pool.clone())),
        roles: Arc::new(PostgresCustomRoleRepository::new(pool.clone())),
        grants: Arc::new(PostgresGrantRepository::new(pool.clone())),
        user_directory: Arc::new(PostgresUserDirectory::new(pool.clone())),
        audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
        cache: Arc::new(cache),
    }
}

pub fn build_app_state(adapters: AccessAdapters) -> AppState {
    let authorization_service = AuthorizationService::new(
        adapters.catalog.clone(),
        adapters.grants.clone(),
        adapters.cache.clone(),
    );
    let permission_catalog_service =
        PermissionCatalogService::new(adapters.catalog.clone(), adapters.audit_repository.clone());
    let role_lifecycle_service = RoleLifecycleService::new(RoleLifecycleDependencies {
        roles: adapters.roles,
        grants: adapters.grants,
        catalog: adapters.catalog,
        user_directory: adapters.user_directory,
        cache: adapters.cache,
        audit_repository: adapters.audit_repository,
    });

    AppState {
        authorization_service,
        permission_catalog_service,
        role_lifecycle_service,
    }
}
