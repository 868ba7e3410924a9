use std::sync::Arc;

use hectara_core::{AppError, AppResult, UserIdentity};
use hectara_domain::{AuditAction, Permission, PermissionId, PermissionKey};
use tracing::info;

use crate::{AuditEvent, AuditRepository, PermissionCatalogRepository};

/// Application service for the permission catalog.
#[derive(Clone)]
pub struct PermissionCatalogService {
    repository: Arc<dyn PermissionCatalogRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl PermissionCatalogService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn PermissionCatalogRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            audit_repository,
        }
    }

    /// Returns every permission ordered by (resource type, action).
    pub async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let mut permissions = self.repository.list_permissions().await?;
        permissions.sort_by_key(|permission| permission.key().display_order());
        Ok(permissions)
    }

    /// Finds the permission registered for a pair.
    pub async fn find_permission(&self, key: PermissionKey) -> AppResult<Option<Permission>> {
        self.repository.find_permission_by_key(key).await
    }

    /// Returns whether a pair is registered.
    pub async fn permission_exists(&self, key: PermissionKey) -> AppResult<bool> {
        Ok(self.repository.find_permission_by_key(key).await?.is_some())
    }

    /// Registers a new permission and emits an audit event.
    pub async fn register_permission(
        &self,
        actor: &UserIdentity,
        key: PermissionKey,
        description: &str,
    ) -> AppResult<Permission> {
        if self.permission_exists(key).await? {
            return Err(duplicate(key));
        }

        let permission = Permission::new(key, description)?;
        self.repository.insert_permission(permission.clone()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.subject().to_owned(),
                action: AuditAction::PermissionRegistered,
                resource_type: "rbac_permission".to_owned(),
                resource_id: permission.id().to_string(),
                detail: Some(format!("registered permission '{key}'")),
            })
            .await?;

        Ok(permission)
    }

    /// Updates the description of a permission and emits an audit event.
    pub async fn update_description(
        &self,
        actor: &UserIdentity,
        permission_id: PermissionId,
        description: &str,
    ) -> AppResult<Permission> {
        let description = Permission::normalize_description(description)?;

        let permission = self
            .repository
            .update_permission_description(permission_id, description.as_str())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.subject().to_owned(),
                action: AuditAction::PermissionDescriptionUpdated,
                resource_type: "rbac_permission".to_owned(),
                resource_id: permission_id.to_string(),
                detail: Some(format!(
                    "updated description of permission '{}'",
                    permission.key()
                )),
            })
            .await?;

        Ok(permission)
    }

    /// Inserts every missing pair of the compiled resource × action matrix.
    ///
    /// Idempotent: existing pairs, including their edited descriptions, are kept.
    pub async fn seed_catalog(&self) -> AppResult<usize> {
        let mut inserted = 0;

        for key in PermissionKey::matrix() {
            if self.permission_exists(key).await? {
                continue;
            }

            match self
                .repository
                .insert_permission(Permission::new(key, key.default_description())?)
                .await
            {
                Ok(()) => inserted += 1,
                // Another instance seeded the pair concurrently.
                Err(AppError::DuplicatePermission { .. }) => {}
                Err(error) => return Err(error),
            }
        }

        info!(inserted, "permission catalog seeded");
        Ok(inserted)
    }
}

fn duplicate(key: PermissionKey) -> AppError {
    AppError::DuplicatePermission {
        resource_type: key.resource_type.as_str().to_owned(),
        action: key.action.as_str().to_owned(),
    }
}
