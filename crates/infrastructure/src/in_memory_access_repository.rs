use std::collections::HashMap;

use async_trait::async_trait;
use hectara_application::{
    AuditEvent, AuditRepository, CustomRoleRepository, GrantRepository,
    PermissionCatalogRepository, UserDirectory,
};
use hectara_core::{AppError, AppResult, CustomRoleId, RoleRef, TenantId};
use hectara_domain::{
    CustomRole, GrantQuery, GrantScope, Permission, PermissionId, PermissionKey, RoleGrant,
};
use tokio::sync::RwLock;


#[derive(Debug, Default)]
struct AccessState {
    permissions: Vec<Permission>,
    roles: HashMap<CustomRoleId, CustomRole>,
    grants: Vec<RoleGrant>,
    users: HashMap<(TenantId, String), RoleRef>,
    audit_events: Vec<AuditEvent>,
}

/// In-memory access-control store implementing every storage port.
///
/// All tables live behind one lock, so grant replacement and role deletion
/// are applied atomically the same way the PostgreSQL adapters apply them
/// inside a transaction.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    state: RwLock<AccessState>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a role to a user, replacing any previous assignment.
    pub async fn assign_user(&self, tenant_id: TenantId, subject: &str, role: RoleRef) {
        self.state
            .write()
            .await
            .users
            .insert((tenant_id, subject.to_owned()), role);
    }

    /// Removes a user from the directory.
    pub async fn remove_user(&self, tenant_id: TenantId, subject: &str) {
        self.state
            .write()
            .await
            .users
            .remove(&(tenant_id, subject.to_owned()));
    }

    /// Returns every audit event appended so far, oldest first.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.state.read().await.audit_events.clone()
    }
}

#[async_trait]
impl PermissionCatalogRepository for InMemoryAccessRepository {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let mut permissions = self.state.read().await.permissions.clone();
        permissions.sort_by_key(|permission| permission.key().display_order());
        Ok(permissions)
    }

    async fn find_permission_by_key(&self, key: PermissionKey) -> AppResult<Option<Permission>> {
        Ok(self
            .state
            .read()
            .await
            .permissions
            .iter()
            .find(|permission| permission.key() == key)
            .cloned())
    }

    async fn find_permissions_by_ids(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>> {
        Ok(self
            .state
            .read()
            .await
            .permissions
            .iter()
            .filter(|permission| permission_ids.contains(&permission.id()))
            .cloned()
            .collect())
    }

    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let mut state = self.state.write().await;
        let key = permission.key();

        if state
            .permissions
            .iter()
            .any(|stored| stored.key() == key || stored.id() == permission.id())
        {
            return Err(AppError::DuplicatePermission {
                resource_type: key.resource_type.as_str().to_owned(),
                action: key.action.as_str().to_owned(),
            });
        }

        state.permissions.push(permission);
        Ok(())
    }

    async fn update_permission_description(
        &self,
        permission_id: PermissionId,
        description: &str,
    ) -> AppResult<Permission> {
        let mut state = self.state.write().await;
        let permission = state
            .permissions
            .iter_mut()
            .find(|permission| permission.id() == permission_id)
            .ok_or_else(|| AppError::UnknownPermission(permission_id.to_string()))?;

        permission.set_description(description)?;
        Ok(permission.clone())
    }
}

#[async_trait]
impl CustomRoleRepository for InMemoryAccessRepository {
    async fn list_custom_roles(&self) -> AppResult<Vec<CustomRole>> {
        let mut roles: Vec<CustomRole> = self.state.read().await.roles.values().cloned().collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn find_custom_role(&self, role_id: CustomRoleId) -> AppResult<Option<CustomRole>> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn find_custom_role_by_name(&self, name: &str) -> AppResult<Option<CustomRole>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .values()
            .find(|role| role.name().as_str() == name)
            .cloned())
    }

    async fn insert_custom_role(&self, role: CustomRole) -> AppResult<()> {
        let mut state = self.state.write().await;

        if state
            .roles
            .values()
            .any(|stored| stored.name() == role.name())
        {
            return Err(AppError::RoleAlreadyExists(role.name().as_str().to_owned()));
        }

        state.roles.insert(role.id(), role);
        Ok(())
    }

    async fn update_custom_role(&self, role: CustomRole) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .roles
            .get_mut(&role.id())
            .ok_or_else(|| AppError::RoleNotFound(role.id().to_string()))?;

        *stored = role;
        Ok(())
    }

    async fn delete_custom_role(&self, role_id: CustomRoleId) -> AppResult<()> {
        let mut state = self.state.write().await;

        if !state.roles.contains_key(&role_id) {
            return Err(AppError::RoleNotFound(role_id.to_string()));
        }

        let role = RoleRef::Custom(role_id);
        if state.users.values().any(|assigned| *assigned == role) {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' was assigned to a user during deletion"
            )));
        }

        remove_custom_role_grants(&mut state, role_id);
        state.roles.remove(&role_id);
        Ok(())
    }
}

#[async_trait]
impl GrantRepository for InMemoryAccessRepository {
    async fn find_grants(&self, role: RoleRef, query: GrantQuery) -> AppResult<Vec<RoleGrant>> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .iter()
            .filter(|grant| grant.role == role && query.matches(grant.scope))
            .cloned()
            .collect())
    }

    async fn replace_grants(
        &self,
        role: RoleRef,
        scope: GrantScope,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<RoleGrant>> {
        let mut state = self.state.write().await;

        if let RoleRef::Custom(role_id) = role
            && !state.roles.contains_key(&role_id)
        {
            return Err(AppError::RoleNotFound(role_id.to_string()));
        }

        if let Some(unknown) = permission_ids.iter().find(|permission_id| {
            !state
                .permissions
                .iter()
                .any(|permission| permission.id() == **permission_id)
        }) {
            return Err(AppError::UnknownPermission(unknown.to_string()));
        }

        let mut inserted: Vec<RoleGrant> = Vec::with_capacity(permission_ids.len());
        for permission_id in permission_ids {
            if inserted
                .iter()
                .any(|grant| grant.permission_id == *permission_id)
            {
                continue;
            }
            inserted.push(RoleGrant::new(role, *permission_id, scope));
        }

        state
            .grants
            .retain(|grant| !(grant.role == role && grant.scope == scope));
        state.grants.extend(inserted.iter().cloned());

        Ok(inserted)
    }

    async fn delete_grants_for_role(&self, role_id: CustomRoleId) -> AppResult<u64> {
        let mut state = self.state.write().await;
        Ok(remove_custom_role_grants(&mut state, role_id))
    }
}

fn remove_custom_role_grants(state: &mut AccessState, role_id: CustomRoleId) -> u64 {
    let before = state.grants.len();
    state
        .grants
        .retain(|grant| grant.role != RoleRef::Custom(role_id));

    u64::try_from(before - state.grants.len()).unwrap_or_default()
}

#[async_trait]
impl UserDirectory for InMemoryAccessRepository {
    async fn count_users_with_role(&self, role_id: CustomRoleId) -> AppResult<u64> {
        let count = self
            .state
            .read()
            .await
            .users
            .values()
            .filter(|role| **role == RoleRef::Custom(role_id))
            .count();

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl AuditRepository for InMemoryAccessRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.state.write().await.audit_events.push(event);
        Ok(())
    }
}
