use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, TenantId};

/// Compiled-in roles that exist for the whole process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemRole {
    /// Deployment-wide administrator.
    SuperAdmin,
    /// Administrator of a single organization.
    OrgAdmin,
    /// Regular organization member.
    User,
}

impl SystemRole {
    /// Returns the stable tag for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::OrgAdmin => "ORG_ADMIN",
            Self::User => "USER",
        }
    }

    /// Returns every system role in display order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SystemRole] = &[SystemRole::SuperAdmin, SystemRole::OrgAdmin, SystemRole::User];

        ALL
    }
}

impl Display for SystemRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            "ORG_ADMIN" => Ok(Self::OrgAdmin),
            "USER" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown system role '{value}'"
            ))),
        }
    }
}

/// Identifier of a persisted custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomRoleId(Uuid);

impl CustomRoleId {
    /// Creates a random custom role identifier.
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

impl Default for CustomRoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CustomRoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for CustomRoleId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")))
    }
}

/// Reference to the role an identity acts under.
///
/// Transport form is `system:<TAG>` or `custom:<uuid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RoleRef {
    /// One of the compiled-in roles.
    System(SystemRole),
    /// A persisted custom role.
    Custom(CustomRoleId),
}

impl RoleRef {
    /// Returns the system role tag when this reference points at one.
    #[must_use]
    pub fn system_role(&self) -> Option<SystemRole> {
        match self {
            Self::System(role) => Some(*role),
            Self::Custom(_) => None,
        }
    }

    /// Returns the custom role id when this reference points at one.
    #[must_use]
    pub fn custom_role_id(&self) -> Option<CustomRoleId> {
        match self {
            Self::System(_) => None,
            Self::Custom(role_id) => Some(*role_id),
        }
    }
}

impl From<SystemRole> for RoleRef {
    fn from(value: SystemRole) -> Self {
        Self::System(value)
    }
}

impl From<CustomRoleId> for RoleRef {
    fn from(value: CustomRoleId) -> Self {
        Self::Custom(value)
    }
}

impl Display for RoleRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System(role) => write!(formatter, "system:{role}"),
            Self::Custom(role_id) => write!(formatter, "custom:{role_id}"),
        }
    }
}

impl FromStr for RoleRef {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().split_once(':') {
            Some(("system", tag)) => SystemRole::from_str(tag).map(Self::System),
            Some(("custom", id)) => CustomRoleId::from_str(id).map(Self::Custom),
            _ => Err(AppError::Validation(format!(
                "role reference '{value}' must be 'system:<TAG>' or 'custom:<id>'"
            ))),
        }
    }
}

/// Acting identity supplied by the session layer for every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    role: RoleRef,
    tenant_id: TenantId,
}

impl UserIdentity {
    /// Creates a user identity from authentication and tenancy data.
    #[must_use]
    pub fn new(subject: impl Into<String>, role: RoleRef, tenant_id: TenantId) -> Self {
        Self {
            subject: subject.into(),
            role,
            tenant_id,
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the role the identity acts under.
    #[must_use]
    pub fn role(&self) -> RoleRef {
        self.role
    }

    /// Returns the tenant linked to the identity.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
