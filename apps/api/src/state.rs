use hectara_application::{AuthorizationService, PermissionCatalogService, RoleLifecycleService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub permission_catalog_service: PermissionCatalogService,
    pub role_lifecycle_service: RoleLifecycleService,
}
