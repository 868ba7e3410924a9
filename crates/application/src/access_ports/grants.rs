use async_trait::async_trait;

use hectara_core::{AppResult, CustomRoleId, RoleRef};
use hectara_domain::{GrantQuery, GrantScope, PermissionId, RoleGrant};

/// Repository port owning role grant rows.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Lists grants of a role selected by the scope query.
    async fn find_grants(&self, role: RoleRef, query: GrantQuery) -> AppResult<Vec<RoleGrant>>;

    /// Replaces every grant of the role in exactly `scope` within one transaction.
    ///
    /// Rows of other scopes are never touched.
    async fn replace_grants(
        &self,
        role: RoleRef,
        scope: GrantScope,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<RoleGrant>>;

    /// Deletes every grant of a custom role across all scopes.
    async fn delete_grants_for_role(&self, role_id: CustomRoleId) -> AppResult<u64>;
}
