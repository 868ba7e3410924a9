use std::collections::HashSet;
use std::sync::Arc;

use hectara_core::{AppError, AppResult, RoleRef, SystemRole, TenantId, UserIdentity};
use hectara_domain::{GrantQuery, PermissionKey};
use tracing::{debug, warn};

use crate::{
    GrantRepository, PermissionCatalogRepository, PermissionResolutionCache, ResolvedPermissionSet,
};

#[cfg(test)]
mod tests;

/// Permission resolver answering tenant-scoped authorization checks.
///
/// System roles resolve through the shared [`PermissionResolutionCache`];
/// custom roles are always resolved fresh from the grant store.
#[derive(Clone)]
pub struct AuthorizationService {
    catalog: Arc<dyn PermissionCatalogRepository>,
    grants: Arc<dyn GrantRepository>,
    cache: Arc<dyn PermissionResolutionCache>,
}

impl AuthorizationService {
    /// Creates a resolver from its collaborators.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn PermissionCatalogRepository>,
        grants: Arc<dyn GrantRepository>,
        cache: Arc<dyn PermissionResolutionCache>,
    ) -> Self {
        Self {
            catalog,
            grants,
            cache,
        }
    }

    /// Returns whether the role may perform `action` on `resource_type` in the tenant.
    ///
    /// Unregistered tags resolve to `false`. Store outages surface as
    /// [`AppError::ResolutionUnavailable`], never as a denial.
    pub async fn has_permission(
        &self,
        role: RoleRef,
        resource_type: &str,
        action: &str,
        tenant_id: TenantId,
    ) -> AppResult<bool> {
        let Ok(key) = PermissionKey::parse(resource_type, action) else {
            debug!(%role, resource_type, action, "unknown capability denied");
            return Ok(false);
        };

        self.has_permission_for_key(role, key, tenant_id).await
    }

    /// Typed variant of [`Self::has_permission`].
    pub async fn has_permission_for_key(
        &self,
        role: RoleRef,
        key: PermissionKey,
        tenant_id: TenantId,
    ) -> AppResult<bool> {
        let permission = self
            .catalog
            .find_permission_by_key(key)
            .await
            .map_err(unavailable)?;

        let Some(permission) = permission else {
            debug!(%role, permission = %key, "permission not registered, denied");
            return Ok(false);
        };

        let granted = self
            .effective_permission_ids(role, tenant_id)
            .await?
            .contains(&permission.id());

        Ok(granted)
    }

    /// Checks a system role. Entry point for callers that only carry a role tag.
    pub async fn check_permission(
        &self,
        role: SystemRole,
        resource_type: &str,
        action: &str,
        tenant_id: TenantId,
    ) -> AppResult<bool> {
        self.has_permission(RoleRef::System(role), resource_type, action, tenant_id)
            .await
    }

    /// Checks the role and tenant carried by a session identity.
    pub async fn check_identity(
        &self,
        identity: &UserIdentity,
        key: PermissionKey,
    ) -> AppResult<bool> {
        self.has_permission_for_key(identity.role(), key, identity.tenant_id())
            .await
    }

    /// Ensures the identity holds the permission.
    pub async fn require_permission(
        &self,
        identity: &UserIdentity,
        key: PermissionKey,
    ) -> AppResult<()> {
        if self.check_identity(identity, key).await? {
            return Ok(());
        }

        warn!(
            subject = identity.subject(),
            role = %identity.role(),
            tenant_id = %identity.tenant_id(),
            permission = %key,
            "permission denied"
        );

        Err(AppError::Forbidden(format!(
            "role '{}' is missing permission '{key}' in tenant '{}'",
            identity.role(),
            identity.tenant_id()
        )))
    }

    /// Lists the resolved permission keys of a role in a tenant, ordered for display.
    pub async fn effective_permissions(
        &self,
        role: RoleRef,
        tenant_id: TenantId,
    ) -> AppResult<Vec<PermissionKey>> {
        let granted = self.effective_permission_ids(role, tenant_id).await?;
        let ids = granted.iter().copied().collect::<Vec<_>>();

        let mut keys = self
            .catalog
            .find_permissions_by_ids(ids.as_slice())
            .await
            .map_err(unavailable)?
            .into_iter()
            .map(|permission| permission.key())
            .collect::<Vec<_>>();
        keys.sort_by_key(PermissionKey::display_order);

        Ok(keys)
    }

    async fn effective_permission_ids(
        &self,
        role: RoleRef,
        tenant_id: TenantId,
    ) -> AppResult<ResolvedPermissionSet> {
        let RoleRef::System(system_role) = role else {
            return self.load_permission_ids(role, tenant_id).await;
        };

        if let Some(cached) = self.cache.get(system_role, tenant_id) {
            debug!(role = %system_role, %tenant_id, "permission cache hit");
            return Ok(cached);
        }

        // Observed before loading so a concurrent invalidation discards this result.
        let generation = self.cache.generation(system_role);
        let resolved = self.load_permission_ids(role, tenant_id).await?;
        let stored = self
            .cache
            .store(system_role, tenant_id, generation, resolved.clone());
        debug!(role = %system_role, %tenant_id, stored, "permission cache miss");

        Ok(resolved)
    }

    async fn load_permission_ids(
        &self,
        role: RoleRef,
        tenant_id: TenantId,
    ) -> AppResult<ResolvedPermissionSet> {
        let grants = self
            .grants
            .find_grants(role, GrantQuery::EffectiveFor(tenant_id))
            .await
            .map_err(unavailable)?;

        Ok(Arc::new(
            grants
                .into_iter()
                .map(|grant| grant.permission_id)
                .collect::<HashSet<_>>(),
        ))
    }
}

fn unavailable(error: AppError) -> AppError {
    match error {
        AppError::ResolutionUnavailable(_) => error,
        other => AppError::ResolutionUnavailable(other.to_string()),
    }
}
