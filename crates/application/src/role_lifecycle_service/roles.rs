use hectara_core::{AppError, CustomRoleId, SystemRole};
use hectara_domain::{CustomRole, CustomRolePatch};
use tracing::{info, warn};

use crate::{CreateCustomRoleInput, RoleStats, RoleSummary};

use super::*;

impl RoleLifecycleService {
    /// Lists system roles followed by custom roles ordered by name.
    pub async fn list_roles(&self) -> AppResult<Vec<RoleSummary>> {
        let mut custom_roles = self.roles.list_custom_roles().await?;
        custom_roles.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(SystemRole::all()
            .iter()
            .copied()
            .map(RoleSummary::from)
            .chain(custom_roles.into_iter().map(RoleSummary::from))
            .collect())
    }

    /// Returns one custom role.
    pub async fn find_role(&self, role_id: CustomRoleId) -> AppResult<CustomRole> {
        self.roles
            .find_custom_role(role_id)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(role_id.to_string()))
    }

    /// Creates a deletable custom role and emits an audit event.
    ///
    /// If only the audit append fails, the role already exists and the error
    /// is reported after the fact.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateCustomRoleInput,
    ) -> AppResult<CustomRole> {
        let role = CustomRole::new(input.name, input.display_name, input.description)?;

        if self
            .roles
            .find_custom_role_by_name(role.name().as_str())
            .await?
            .is_some()
        {
            return Err(AppError::RoleAlreadyExists(role.name().as_str().to_owned()));
        }

        self.roles.insert_custom_role(role.clone()).await?;
        info!(role_id = %role.id(), name = %role.name(), "custom role created");

        self.append_audit_event(
            actor,
            AuditAction::RoleCreated,
            "rbac_custom_role",
            role.id().to_string(),
            format!("created role '{}'", role.name()),
        )
        .await?;

        Ok(role)
    }

    /// Updates display name and/or description of a custom role.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        role_id: CustomRoleId,
        patch: CustomRolePatch,
    ) -> AppResult<CustomRole> {
        let mut role = self.find_role(role_id).await?;
        role.apply_patch(patch)?;

        self.roles.update_custom_role(role.clone()).await?;

        self.append_audit_event(
            actor,
            AuditAction::RoleUpdated,
            "rbac_custom_role",
            role_id.to_string(),
            format!("updated role '{}'", role.name()),
        )
        .await?;

        Ok(role)
    }

    /// Deletes a custom role and all of its grants.
    ///
    /// Every guard runs before the first write, so a rejected delete leaves
    /// the catalog and grant store untouched.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: CustomRoleId) -> AppResult<()> {
        let role = self.find_role(role_id).await?;

        if role.is_system() || !role.can_be_deleted() {
            warn!(%role_id, "blocked delete of protected role");
            return Err(AppError::RoleNotDeletable(role.name().as_str().to_owned()));
        }

        let assigned_users = self.user_directory.count_users_with_role(role_id).await?;
        if assigned_users > 0 {
            warn!(%role_id, assigned_users, "blocked delete of assigned role");
            return Err(AppError::RoleHasAssignedUsers {
                role_id: role_id.to_string(),
                count: assigned_users,
            });
        }

        self.roles.delete_custom_role(role_id).await?;
        info!(%role_id, name = %role.name(), "custom role deleted");

        self.append_audit_event(
            actor,
            AuditAction::RoleDeleted,
            "rbac_custom_role",
            role_id.to_string(),
            format!("deleted role '{}'", role.name()),
        )
        .await
    }

    /// Returns the deletion-safety projection of a custom role.
    pub async fn role_stats(&self, role_id: CustomRoleId) -> AppResult<RoleStats> {
        let role = self.find_role(role_id).await?;
        let assigned_users = self.user_directory.count_users_with_role(role_id).await?;

        let reason = if role.is_system() || !role.can_be_deleted() {
            Some("system role".to_owned())
        } else if assigned_users > 0 {
            Some(format!("assigned to {assigned_users} user(s)"))
        } else {
            None
        };

        Ok(RoleStats {
            role_id,
            assigned_users,
            can_delete: reason.is_none(),
            reason,
        })
    }
}
