use std::collections::HashSet;
use std::sync::Arc;

use hectara_core::{SystemRole, TenantId};
use hectara_domain::PermissionId;

/// Effective permission ids resolved for one (role, tenant) pair.
pub type ResolvedPermissionSet = Arc<HashSet<PermissionId>>;

/// Invalidation counter observed before a cache-miss resolution.
pub type CacheGeneration = u64;

/// In-process cache of resolved grant sets for system roles.
///
/// Methods are synchronous: implementations hold no I/O and must never
/// suspend the caller.
pub trait PermissionResolutionCache: Send + Sync {
    /// Returns the cached set for the role under a tenant, if present.
    fn get(&self, role: SystemRole, tenant_id: TenantId) -> Option<ResolvedPermissionSet>;

    /// Returns the current invalidation generation of the role.
    fn generation(&self, role: SystemRole) -> CacheGeneration;

    /// Stores a resolved set computed while `generation` was current.
    ///
    /// Returns `false` and drops the set when the role was invalidated
    /// after `generation` was observed.
    fn store(
        &self,
        role: SystemRole,
        tenant_id: TenantId,
        generation: CacheGeneration,
        permissions: ResolvedPermissionSet,
    ) -> bool;

    /// Drops every cached entry of the role across all tenants.
    fn clear_role(&self, role: SystemRole);
}
