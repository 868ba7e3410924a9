use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Mutex;

use hectara_core::{
    AppError, AppResult, CustomRoleId, RoleRef, SystemRole, TenantId, UserIdentity,
};
use hectara_domain::{
    CustomRole, GrantQuery, GrantScope, Permission, PermissionAction, PermissionId, PermissionKey,
    ResourceType, RoleGrant,
};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, CacheGeneration, CustomRoleRepository,
    GrantRepository, PermissionCatalogRepository, PermissionResolutionCache,
    ResolvedPermissionSet, RoleLifecycleDependencies, RoleLifecycleService, UserDirectory,
};

/// Single fake backing every storage port, so cascades stay consistent.
#[derive(Default)]
pub(crate) struct FakeAccessStore {
    pub permissions: Mutex<Vec<Permission>>,
    pub roles: Mutex<Vec<CustomRole>>,
    pub grants: Mutex<Vec<RoleGrant>>,
    pub assigned_users: Mutex<HashMap<CustomRoleId, u64>>,
    pub grant_reads: AtomicUsize,
    pub grant_store_down: AtomicBool,
    after_next_grant_read: StdMutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl FakeAccessStore {
    pub async fn with_permissions(keys: &[PermissionKey]) -> Arc<Self> {
        let store = Arc::new(Self::default());
        {
            let mut permissions = store.permissions.lock().await;
            for key in keys {
                let permission = Permission::new(*key, key.default_description())
                    .unwrap_or_else(|_| unreachable!());
                permissions.push(permission);
            }
        }
        store
    }

    pub async fn permission_id(&self, key: PermissionKey) -> PermissionId {
        self.permissions
            .lock()
            .await
            .iter()
            .find(|permission| permission.key() == key)
            .map(Permission::id)
            .unwrap_or_else(|| unreachable!())
    }

    pub async fn grant(&self, role: RoleRef, permission_id: PermissionId, scope: GrantScope) {
        self.grants
            .lock()
            .await
            .push(RoleGrant::new(role, permission_id, scope));
    }

    pub async fn insert_role(&self, role: CustomRole) {
        self.roles.lock().await.push(role);
    }

    pub async fn set_assigned_users(&self, role_id: CustomRoleId, count: u64) {
        self.assigned_users.lock().await.insert(role_id, count);
    }

    pub fn grant_reads(&self) -> usize {
        self.grant_reads.load(Ordering::SeqCst)
    }

    pub fn set_grant_store_down(&self, down: bool) {
        self.grant_store_down.store(down, Ordering::SeqCst);
    }

    /// Runs `hook` once, after the next grant read has loaded its rows.
    pub fn after_next_grant_read(&self, hook: impl FnOnce() + Send + 'static) {
        *self
            .after_next_grant_read
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
    }
}

#[async_trait]
impl PermissionCatalogRepository for FakeAccessStore {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(self.permissions.lock().await.clone())
    }

    async fn find_permission_by_key(&self, key: PermissionKey) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .lock()
            .await
            .iter()
            .find(|permission| permission.key() == key)
            .cloned())
    }

    async fn find_permissions_by_ids(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>> {
        Ok(self
            .permissions
            .lock()
            .await
            .iter()
            .filter(|permission| permission_ids.contains(&permission.id()))
            .cloned()
            .collect())
    }

    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        self.permissions.lock().await.push(permission);
        Ok(())
    }

    async fn update_permission_description(
        &self,
        permission_id: PermissionId,
        _description: &str,
    ) -> AppResult<Permission> {
        Err(AppError::UnknownPermission(permission_id.to_string()))
    }
}

#[async_trait]
impl GrantRepository for FakeAccessStore {
    async fn find_grants(&self, role: RoleRef, query: GrantQuery) -> AppResult<Vec<RoleGrant>> {
        self.grant_reads.fetch_add(1, Ordering::SeqCst);
        if self.grant_store_down.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection refused".to_owned()));
        }

        let grants = self
            .grants
            .lock()
            .await
            .iter()
            .filter(|grant| grant.role == role && query.matches(grant.scope))
            .cloned()
            .collect();

        let hook = self
            .after_next_grant_read
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hook) = hook {
            hook();
        }

        Ok(grants)
    }

    async fn replace_grants(
        &self,
        role: RoleRef,
        scope: GrantScope,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<RoleGrant>> {
        let mut grants = self.grants.lock().await;
        grants.retain(|grant| !(grant.role == role && grant.scope == scope));

        let inserted = permission_ids
            .iter()
            .map(|permission_id| RoleGrant::new(role, *permission_id, scope))
            .collect::<Vec<_>>();
        grants.extend(inserted.iter().cloned());

        Ok(inserted)
    }

    async fn delete_grants_for_role(&self, role_id: CustomRoleId) -> AppResult<u64> {
        let mut grants = self.grants.lock().await;
        let before = grants.len();
        grants.retain(|grant| grant.role != RoleRef::Custom(role_id));
        Ok((before - grants.len()) as u64)
    }
}

#[async_trait]
impl CustomRoleRepository for FakeAccessStore {
    async fn list_custom_roles(&self) -> AppResult<Vec<CustomRole>> {
        Ok(self.roles.lock().await.clone())
    }

    async fn find_custom_role(&self, role_id: CustomRoleId) -> AppResult<Option<CustomRole>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn find_custom_role_by_name(&self, name: &str) -> AppResult<Option<CustomRole>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.name().as_str() == name)
            .cloned())
    }

    async fn insert_custom_role(&self, role: CustomRole) -> AppResult<()> {
        self.roles.lock().await.push(role);
        Ok(())
    }

    async fn update_custom_role(&self, role: CustomRole) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let stored = roles
            .iter_mut()
            .find(|stored| stored.id() == role.id())
            .ok_or_else(|| AppError::RoleNotFound(role.id().to_string()))?;
        *stored = role;
        Ok(())
    }

    async fn delete_custom_role(&self, role_id: CustomRoleId) -> AppResult<()> {
        self.delete_grants_for_role(role_id).await?;
        self.roles.lock().await.retain(|role| role.id() != role_id);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for FakeAccessStore {
    async fn count_users_with_role(&self, role_id: CustomRoleId) -> AppResult<u64> {
        Ok(self
            .assigned_users
            .lock()
            .await
            .get(&role_id)
            .copied()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub(crate) struct FakeResolutionCache {
    entries: StdMutex<HashMap<SystemRole, (CacheGeneration, HashMap<TenantId, ResolvedPermissionSet>)>>,
}

impl PermissionResolutionCache for FakeResolutionCache {
    fn get(&self, role: SystemRole, tenant_id: TenantId) -> Option<ResolvedPermissionSet> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&role)
            .and_then(|(_, tenants)| tenants.get(&tenant_id).cloned())
    }

    fn generation(&self, role: SystemRole) -> CacheGeneration {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&role)
            .map(|(generation, _)| *generation)
            .unwrap_or_default()
    }

    fn store(
        &self,
        role: SystemRole,
        tenant_id: TenantId,
        generation: CacheGeneration,
        permissions: ResolvedPermissionSet,
    ) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(role).or_default();
        if entry.0 != generation {
            return false;
        }
        entry.1.insert(tenant_id, permissions);
        true
    }

    fn clear_role(&self, role: SystemRole) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(role).or_default();
        entry.0 += 1;
        entry.1.clear();
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub events: Mutex<Vec<AuditEvent>>,
    pub unavailable: AtomicBool,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit sink unavailable".to_owned()));
        }
        self.events.lock().await.push(event);
        Ok(())
    }
}

pub(crate) fn field_view() -> PermissionKey {
    PermissionKey::new(ResourceType::Field, PermissionAction::View)
}

pub(crate) fn field_edit() -> PermissionKey {
    PermissionKey::new(ResourceType::Field, PermissionAction::Edit)
}

pub(crate) fn invoice_view() -> PermissionKey {
    PermissionKey::new(ResourceType::Invoice, PermissionAction::View)
}

pub(crate) fn admin_actor() -> UserIdentity {
    UserIdentity::new(
        "admin",
        RoleRef::System(SystemRole::SuperAdmin),
        TenantId::new(),
    )
}

/// Fully wired services over one shared fake store and cache.
pub(crate) struct Harness {
    pub store: Arc<FakeAccessStore>,
    pub cache: Arc<FakeResolutionCache>,
    pub audit: Arc<FakeAuditRepository>,
    pub authorization: AuthorizationService,
    pub lifecycle: RoleLifecycleService,
}

impl Harness {
    pub async fn new() -> Self {
        let store = FakeAccessStore::with_permissions(&[field_view(), field_edit(), invoice_view()])
            .await;
        let cache = Arc::new(FakeResolutionCache::default());
        let audit = Arc::new(FakeAuditRepository::default());

        let authorization = AuthorizationService::new(store.clone(), store.clone(), cache.clone());
        let lifecycle = RoleLifecycleService::new(RoleLifecycleDependencies {
            roles: store.clone(),
            grants: store.clone(),
            catalog: store.clone(),
            user_directory: store.clone(),
            cache: cache.clone(),
            audit_repository: audit.clone(),
        });

        Self {
            store,
            cache,
            audit,
            authorization,
            lifecycle,
        }
    }
}
