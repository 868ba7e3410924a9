use async_trait::async_trait;

use hectara_core::{AppResult, CustomRoleId};

/// Read-only port into the user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Counts users currently referencing the custom role.
    async fn count_users_with_role(&self, role_id: CustomRoleId) -> AppResult<u64>;
}
