use std::sync::Arc;

use hectara_core::{AppResult, UserIdentity};
use hectara_domain::AuditAction;
use tracing::error;

use crate::{
    AuditEvent, AuditRepository, CustomRoleRepository, GrantRepository,
    PermissionCatalogRepository, PermissionResolutionCache, UserDirectory,
};

mod permissions;
mod roles;


/// Use-case layer for custom role administration and grant replacement.
///
/// This is the only writer of the grant store and the only caller that
/// invalidates the resolution cache.
///
/// Mutations append their audit event after the store write has committed.
/// An audit failure is still returned to the caller, but the change itself
/// stays in effect and is not rolled back.
#[derive(Clone)]
pub struct RoleLifecycleService {
    roles: Arc<dyn CustomRoleRepository>,
    grants: Arc<dyn GrantRepository>,
    catalog: Arc<dyn PermissionCatalogRepository>,
    user_directory: Arc<dyn UserDirectory>,
    cache: Arc<dyn PermissionResolutionCache>,
    audit_repository: Arc<dyn AuditRepository>,
}

/// Collaborators required by [`RoleLifecycleService`].
pub struct RoleLifecycleDependencies {
    /// Custom role catalog.
    pub roles: Arc<dyn CustomRoleRepository>,
    /// Grant store.
    pub grants: Arc<dyn GrantRepository>,
    /// Permission catalog used to validate grant targets.
    pub catalog: Arc<dyn PermissionCatalogRepository>,
    /// User directory used by deletion guards.
    pub user_directory: Arc<dyn UserDirectory>,
    /// Resolution cache shared with the resolver.
    pub cache: Arc<dyn PermissionResolutionCache>,
    /// Audit sink.
    pub audit_repository: Arc<dyn AuditRepository>,
}

impl RoleLifecycleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(dependencies: RoleLifecycleDependencies) -> Self {
        Self {
            roles: dependencies.roles,
            grants: dependencies.grants,
            catalog: dependencies.catalog,
            user_directory: dependencies.user_directory,
            cache: dependencies.cache,
            audit_repository: dependencies.audit_repository,
        }
    }

    /// Appends an audit event for a change that is already committed.
    async fn append_audit_event(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.subject().to_owned(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail: Some(detail),
            })
            .await
            .inspect_err(|audit_error| {
                error!(
                    subject = actor.subject(),
                    ?action,
                    error = %audit_error,
                    "audit event lost for committed change"
                );
            })
    }
}
