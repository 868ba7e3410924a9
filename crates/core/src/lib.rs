//! Shared primitives for all Rust crates in Hectara.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::{CustomRoleId, RoleRef, SystemRole, UserIdentity};

/// Result type used across Hectara crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Tenant (organization) identifier used to scope grants and identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID value.
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

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid tenant id '{value}': {error}")))
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A permission identifier is not registered in the catalog.
    #[error("unknown permission '{0}'")]
    UnknownPermission(String),

    /// A (resource type, action) pair is already registered.
    #[error("permission '{resource_type}:{action}' already exists")]
    DuplicatePermission {
        /// Resource type tag of the duplicate pair.
        resource_type: String,
        /// Action tag of the duplicate pair.
        action: String,
    },

    /// A custom role with the same name already exists.
    #[error("role '{0}' already exists")]
    RoleAlreadyExists(String),

    /// The targeted role does not exist.
    #[error("role '{0}' was not found")]
    RoleNotFound(String),

    /// The targeted role is flagged as non-deletable.
    #[error("role '{0}' cannot be deleted")]
    RoleNotDeletable(String),

    /// The targeted role is still referenced by users.
    #[error("role '{role_id}' is assigned to {count} user(s)")]
    RoleHasAssignedUsers {
        /// Identifier of the role that was targeted.
        role_id: String,
        /// Number of users still referencing the role.
        count: u64,
    },

    /// A grant mutation targeted the wrong role family.
    #[error("system role grant conflict: {0}")]
    SystemRoleGrantConflict(String),

    /// The grant store could not be reached while resolving a decision.
    #[error("permission resolution unavailable: {0}")]
    ResolutionUnavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{AppError, NonEmptyString, TenantId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_trims_input() {
        let value = NonEmptyString::new("  auditor ").unwrap_or_else(|_| unreachable!());
        assert_eq!(value.as_str(), "auditor");
    }

    #[test]
    fn tenant_id_formats_as_uuid() {
        let tenant_id = TenantId::new();
        assert_eq!(tenant_id.to_string().len(), 36);
    }

    #[test]
    fn tenant_id_parses_its_display_form() {
        let tenant_id = TenantId::new();
        let parsed = TenantId::from_str(tenant_id.to_string().as_str());
        assert!(matches!(parsed, Ok(value) if value == tenant_id));
    }

    #[test]
    fn assigned_users_error_reports_count() {
        let error = AppError::RoleHasAssignedUsers {
            role_id: "r1".to_owned(),
            count: 3,
        };
        assert_eq!(error.to_string(), "role 'r1' is assigned to 3 user(s)");
    }
}
