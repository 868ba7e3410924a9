use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use hectara_application::{CacheGeneration, PermissionResolutionCache, ResolvedPermissionSet};
use hectara_core::{SystemRole, TenantId};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedResolution {
    permissions: ResolvedPermissionSet,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct RoleEntry {
    generation: CacheGeneration,
    tenants: HashMap<TenantId, CachedResolution>,
}

/// Process-local resolution cache keyed by system role.
///
/// Each role maps to an immutable snapshot. Writers build a replacement
/// snapshot and swap it in under a short write lock, so readers always see
/// either the old or the new snapshot and never a partially cleared one.
#[derive(Debug, Default)]
pub struct InMemoryPermissionResolutionCache {
    roles: RwLock<HashMap<SystemRole, Arc<RoleEntry>>>,
    ttl: Option<Duration>,
}

impl InMemoryPermissionResolutionCache {
    /// Creates a cache whose entries live until invalidated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache whose entries additionally expire after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            roles: RwLock::default(),
            ttl: Some(ttl),
        }
    }

    fn snapshot(&self, role: SystemRole) -> Option<Arc<RoleEntry>> {
        self.roles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&role)
            .cloned()
    }

    fn is_expired(&self, resolution: &CachedResolution) -> bool {
        self.ttl
            .is_some_and(|ttl| resolution.stored_at.elapsed() >= ttl)
    }
}

impl PermissionResolutionCache for InMemoryPermissionResolutionCache {
    fn get(&self, role: SystemRole, tenant_id: TenantId) -> Option<ResolvedPermissionSet> {
        let snapshot = self.snapshot(role)?;
        let resolution = snapshot.tenants.get(&tenant_id)?;

        if self.is_expired(resolution) {
            debug!(%role, %tenant_id, "cached resolution expired");
            return None;
        }

        Some(resolution.permissions.clone())
    }

    fn generation(&self, role: SystemRole) -> CacheGeneration {
        self.snapshot(role)
            .map(|snapshot| snapshot.generation)
            .unwrap_or_default()
    }

    fn store(
        &self,
        role: SystemRole,
        tenant_id: TenantId,
        generation: CacheGeneration,
        permissions: ResolvedPermissionSet,
    ) -> bool {
        let mut roles = self.roles.write().unwrap_or_else(PoisonError::into_inner);
        let current = roles.get(&role).cloned().unwrap_or_default();

        if current.generation != generation {
            debug!(%role, %tenant_id, generation, current = current.generation, "dropped stale resolution");
            return false;
        }

        let mut tenants = current.tenants.clone();
        tenants.insert(
            tenant_id,
            CachedResolution {
                permissions,
                stored_at: Instant::now(),
            },
        );
        roles.insert(
            role,
            Arc::new(RoleEntry {
                generation,
                tenants,
            }),
        );

        true
    }

    fn clear_role(&self, role: SystemRole) {
        let mut roles = self.roles.write().unwrap_or_else(PoisonError::into_inner);
        let generation = roles
            .get(&role)
            .map(|snapshot| snapshot.generation)
            .unwrap_or_default()
            .wrapping_add(1);

        roles.insert(
            role,
            Arc::new(RoleEntry {
                generation,
                tenants: HashMap::new(),
            }),
        );
        debug!(%role, generation, "resolution cache cleared for role");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use hectara_application::{PermissionResolutionCache, ResolvedPermissionSet};
    use hectara_core::{SystemRole, TenantId};
    use hectara_domain::PermissionId;

    use super::InMemoryPermissionResolutionCache;

    fn resolved(ids: &[PermissionId]) -> ResolvedPermissionSet {
        Arc::new(ids.iter().copied().collect::<HashSet<_>>())
    }

    #[test]
    fn stored_resolution_is_returned_per_tenant() {
        let cache = InMemoryPermissionResolutionCache::new();
        let acme = TenantId::new();
        let other = TenantId::new();
        let permission_id = PermissionId::new();

        let generation = cache.generation(SystemRole::OrgAdmin);
        assert!(cache.store(SystemRole::OrgAdmin, acme, generation, resolved(&[permission_id])));

        assert!(matches!(
            cache.get(SystemRole::OrgAdmin, acme),
            Some(set) if set.contains(&permission_id)
        ));
        assert!(cache.get(SystemRole::OrgAdmin, other).is_none());
        assert!(cache.get(SystemRole::User, acme).is_none());
    }

    #[test]
    fn clear_role_drops_every_tenant_of_that_role_only() {
        let cache = InMemoryPermissionResolutionCache::new();
        let acme = TenantId::new();
        let other = TenantId::new();

        for tenant_id in [acme, other] {
            let generation = cache.generation(SystemRole::OrgAdmin);
            assert!(cache.store(SystemRole::OrgAdmin, tenant_id, generation, resolved(&[])));
        }
        let generation = cache.generation(SystemRole::User);
        assert!(cache.store(SystemRole::User, acme, generation, resolved(&[])));

        cache.clear_role(SystemRole::OrgAdmin);

        assert!(cache.get(SystemRole::OrgAdmin, acme).is_none());
        assert!(cache.get(SystemRole::OrgAdmin, other).is_none());
        assert!(cache.get(SystemRole::User, acme).is_some());
    }

    #[test]
    fn resolution_observed_before_invalidation_is_dropped() {
        let cache = InMemoryPermissionResolutionCache::new();
        let acme = TenantId::new();

        let observed = cache.generation(SystemRole::SuperAdmin);
        cache.clear_role(SystemRole::SuperAdmin);

        assert!(!cache.store(SystemRole::SuperAdmin, acme, observed, resolved(&[])));
        assert!(cache.get(SystemRole::SuperAdmin, acme).is_none());
        assert_eq!(cache.generation(SystemRole::SuperAdmin), observed + 1);
    }

    #[test]
    fn reader_snapshot_survives_concurrent_clear() {
        let cache = Arc::new(InMemoryPermissionResolutionCache::new());
        let acme = TenantId::new();
        let permission_id = PermissionId::new();
        let generation = cache.generation(SystemRole::OrgAdmin);
        assert!(cache.store(SystemRole::OrgAdmin, acme, generation, resolved(&[permission_id])));

        let held = cache.get(SystemRole::OrgAdmin, acme);
        std::thread::scope(|scope| {
            scope.spawn(|| cache.clear_role(SystemRole::OrgAdmin));
        });

        assert!(matches!(held, Some(set) if set.contains(&permission_id)));
        assert!(cache.get(SystemRole::OrgAdmin, acme).is_none());
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = InMemoryPermissionResolutionCache::with_ttl(Duration::ZERO);
        let acme = TenantId::new();

        let generation = cache.generation(SystemRole::User);
        assert!(cache.store(SystemRole::User, acme, generation, resolved(&[])));

        assert!(cache.get(SystemRole::User, acme).is_none());
    }
}
