use std::fmt::{Display, Formatter};

use hectara_core::{RoleRef, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PermissionId;

/// Stable identifier of a role grant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantId(Uuid);

impl GrantId {
    /// Creates a random grant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for GrantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GrantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Tenant visibility of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tenant_id", rename_all = "snake_case")]
pub enum GrantScope {
    /// Baseline grant visible to every tenant.
    Global,
    /// Additive grant visible only to one tenant.
    Tenant(TenantId),
}

impl GrantScope {
    /// Builds a scope from a nullable tenant column.
    #[must_use]
    pub fn from_tenant(tenant_id: Option<TenantId>) -> Self {
        tenant_id.map_or(Self::Global, Self::Tenant)
    }

    /// Returns the tenant column value for this scope.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Self::Global => None,
            Self::Tenant(tenant_id) => Some(*tenant_id),
        }
    }

    /// Returns whether a grant in this scope applies when resolving for `tenant_id`.
    #[must_use]
    pub fn is_visible_to(&self, tenant_id: TenantId) -> bool {
        match self {
            Self::Global => true,
            Self::Tenant(scoped) => *scoped == tenant_id,
        }
    }
}

impl Display for GrantScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => formatter.write_str("global"),
            Self::Tenant(tenant_id) => write!(formatter, "tenant:{tenant_id}"),
        }
    }
}

/// Scope filter used when listing grants of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantQuery {
    /// Only global grants.
    GlobalOnly,
    /// Every grant regardless of scope.
    AllScopes,
    /// Global grants plus grants scoped to the tenant.
    EffectiveFor(TenantId),
}

impl GrantQuery {
    /// Returns whether a grant with `scope` is selected by this query.
    #[must_use]
    pub fn matches(&self, scope: GrantScope) -> bool {
        match self {
            Self::GlobalOnly => scope == GrantScope::Global,
            Self::AllScopes => true,
            Self::EffectiveFor(tenant_id) => scope.is_visible_to(*tenant_id),
        }
    }
}

/// Binding of a role to a permission within a scope.
///
/// The role is a [`RoleRef`], so a grant always targets exactly one of a
/// system role or a custom role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Stable grant identifier.
    pub id: GrantId,
    /// Role receiving the permission.
    pub role: RoleRef,
    /// Granted permission.
    pub permission_id: PermissionId,
    /// Tenant visibility.
    pub scope: GrantScope,
}

impl RoleGrant {
    /// Creates a grant with a fresh identifier.
    #[must_use]
    pub fn new(role: RoleRef, permission_id: PermissionId, scope: GrantScope) -> Self {
        Self {
            id: GrantId::new(),
            role,
            permission_id,
            scope,
        }
    }
}
