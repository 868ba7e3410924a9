use std::collections::HashSet;

use hectara_core::{AppError, CustomRoleId, RoleRef, SystemRole};
use hectara_domain::{GrantQuery, GrantScope, PermissionId, RoleGrant};
use tracing::info;

use super::*;

impl RoleLifecycleService {
    /// Lists grants of a system role selected by the scope query.
    pub async fn role_permissions(
        &self,
        role: SystemRole,
        query: GrantQuery,
    ) -> AppResult<Vec<RoleGrant>> {
        self.grants.find_grants(RoleRef::System(role), query).await
    }

    /// Lists grants of a custom role selected by the scope query.
    pub async fn custom_role_permissions(
        &self,
        role_id: CustomRoleId,
        query: GrantQuery,
    ) -> AppResult<Vec<RoleGrant>> {
        self.find_role(role_id).await?;
        self.grants.find_grants(RoleRef::Custom(role_id), query).await
    }

    /// Replaces the grants of a system role in one scope and invalidates its cache entry.
    pub async fn update_role_permissions(
        &self,
        actor: &UserIdentity,
        role: SystemRole,
        scope: GrantScope,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<RoleGrant>> {
        self.replace_grants(actor, RoleRef::System(role), scope, permission_ids)
            .await
    }

    /// Replaces the grants of a custom role in one scope.
    pub async fn update_custom_role_permissions(
        &self,
        actor: &UserIdentity,
        role_id: CustomRoleId,
        scope: GrantScope,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<RoleGrant>> {
        self.replace_grants(actor, RoleRef::Custom(role_id), scope, permission_ids)
            .await
    }

    async fn replace_grants(
        &self,
        actor: &UserIdentity,
        role: RoleRef,
        scope: GrantScope,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<RoleGrant>> {
        let permission_ids = deduplicate(permission_ids);
        self.ensure_permissions_exist(permission_ids.as_slice())
            .await?;

        if let RoleRef::Custom(role_id) = role {
            let custom_role = self.find_role(role_id).await?;
            if custom_role.is_system() {
                return Err(AppError::SystemRoleGrantConflict(format!(
                    "role '{}' is flagged as system and cannot be changed through custom role grants",
                    custom_role.name()
                )));
            }
        }

        let grants = self
            .grants
            .replace_grants(role, scope, permission_ids.as_slice())
            .await?;

        // Only after the replace committed, so readers cannot repopulate from stale rows.
        if let RoleRef::System(system_role) = role {
            self.cache.clear_role(system_role);
        }

        info!(%role, %scope, granted = grants.len(), "role permissions replaced");

        self.append_audit_event(
            actor,
            AuditAction::RolePermissionsReplaced,
            "rbac_role_permission",
            format!("{role}@{scope}"),
            format!(
                "replaced {scope} permissions of '{role}' with {} grant(s)",
                grants.len()
            ),
        )
        .await?;

        Ok(grants)
    }

    async fn ensure_permissions_exist(&self, permission_ids: &[PermissionId]) -> AppResult<()> {
        if permission_ids.is_empty() {
            return Ok(());
        }

        let known = self
            .catalog
            .find_permissions_by_ids(permission_ids)
            .await?
            .into_iter()
            .map(|permission| permission.id())
            .collect::<HashSet<_>>();

        match permission_ids
            .iter()
            .find(|permission_id| !known.contains(permission_id))
        {
            Some(unknown) => Err(AppError::UnknownPermission(unknown.to_string())),
            None => Ok(()),
        }
    }
}

fn deduplicate(permission_ids: &[PermissionId]) -> Vec<PermissionId> {
    let mut seen = HashSet::with_capacity(permission_ids.len());
    permission_ids
        .iter()
        .copied()
        .filter(|permission_id| seen.insert(*permission_id))
        .collect()
}
