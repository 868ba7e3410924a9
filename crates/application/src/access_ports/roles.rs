use async_trait::async_trait;

use hectara_core::{AppResult, CustomRoleId, RoleRef, SystemRole};
use hectara_domain::CustomRole;

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomRoleInput {
    /// Catalog-unique role name.
    pub name: String,
    /// Display name shown to administrators.
    pub display_name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Deletion-safety projection of a custom role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleStats {
    /// Role identifier.
    pub role_id: CustomRoleId,
    /// Users currently referencing the role.
    pub assigned_users: u64,
    /// Whether a delete would currently succeed.
    pub can_delete: bool,
    /// Why a delete would fail, when it would.
    pub reason: Option<String>,
}

/// Unified listing row for system and custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSummary {
    /// Role reference used by grant and check operations.
    pub role: RoleRef,
    /// Stable role name.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether the role is system-managed.
    pub is_system: bool,
    /// Whether the role may ever be deleted.
    pub can_be_deleted: bool,
}

impl From<SystemRole> for RoleSummary {
    fn from(value: SystemRole) -> Self {
        let display_name = match value {
            SystemRole::SuperAdmin => "Super administrator",
            SystemRole::OrgAdmin => "Organization administrator",
            SystemRole::User => "User",
        };

        Self {
            role: RoleRef::System(value),
            name: value.as_str().to_owned(),
            display_name: display_name.to_owned(),
            description: None,
            is_system: true,
            can_be_deleted: false,
        }
    }
}

impl From<CustomRole> for RoleSummary {
    fn from(value: CustomRole) -> Self {
        Self {
            role: RoleRef::Custom(value.id()),
            name: value.name().as_str().to_owned(),
            display_name: value.display_name().as_str().to_owned(),
            description: value.description().map(str::to_owned),
            is_system: value.is_system(),
            can_be_deleted: value.can_be_deleted(),
        }
    }
}

/// Repository port for the custom role catalog.
#[async_trait]
pub trait CustomRoleRepository: Send + Sync {
    /// Lists custom roles ordered by name.
    async fn list_custom_roles(&self) -> AppResult<Vec<CustomRole>>;

    /// Finds one custom role by id.
    async fn find_custom_role(&self, role_id: CustomRoleId) -> AppResult<Option<CustomRole>>;

    /// Finds one custom role by its catalog-unique name.
    async fn find_custom_role_by_name(&self, name: &str) -> AppResult<Option<CustomRole>>;

    /// Inserts a role, failing with `RoleAlreadyExists` on a taken name.
    async fn insert_custom_role(&self, role: CustomRole) -> AppResult<()>;

    /// Persists display name and description of an existing role.
    async fn update_custom_role(&self, role: CustomRole) -> AppResult<()>;

    /// Deletes a role and all of its grants in one transaction.
    async fn delete_custom_role(&self, role_id: CustomRoleId) -> AppResult<()>;
}
