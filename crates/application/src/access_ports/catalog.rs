use async_trait::async_trait;

use hectara_core::AppResult;
use hectara_domain::{Permission, PermissionId, PermissionKey};

/// Repository port for the permission catalog.
#[async_trait]
pub trait PermissionCatalogRepository: Send + Sync {
    /// Lists every permission ordered by (resource type, action).
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Finds the permission registered for a (resource type, action) pair.
    async fn find_permission_by_key(&self, key: PermissionKey) -> AppResult<Option<Permission>>;

    /// Returns the subset of `permission_ids` that exist, in any order.
    async fn find_permissions_by_ids(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>>;

    /// Inserts a permission, failing with `DuplicatePermission` on a taken pair.
    async fn insert_permission(&self, permission: Permission) -> AppResult<()>;

    /// Persists a new description for an existing permission.
    async fn update_permission_description(
        &self,
        permission_id: PermissionId,
        description: &str,
    ) -> AppResult<Permission>;
}
