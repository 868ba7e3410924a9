use std::str::FromStr;

use hectara_core::{AppError, AppResult, CustomRoleId, NonEmptyString, SystemRole};
use serde::{Deserialize, Serialize};

/// Maximum length of a custom role name.
pub const CUSTOM_ROLE_NAME_MAX_LENGTH: usize = 64;

/// Administrator-defined role persisted in the role catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRole {
    id: CustomRoleId,
    name: NonEmptyString,
    display_name: NonEmptyString,
    description: Option<String>,
    is_system: bool,
    can_be_deleted: bool,
}

/// Partial update applied to a custom role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomRolePatch {
    /// New display name, when provided.
    pub display_name: Option<String>,
    /// New description, when provided. An empty string clears it.
    pub description: Option<String>,
}

impl CustomRole {
    /// Creates a deletable, non-system custom role.
    ///
    /// Names are catalog-wide keys: they are upper-cased, limited to
    /// `A-Z`, `0-9` and `_`, and may not shadow a system role tag.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: CustomRoleId::new(),
            name: normalize_role_name(name.into())?,
            display_name: NonEmptyString::new(display_name)?,
            description: normalize_description(description),
            is_system: false,
            can_be_deleted: true,
        })
    }

    /// Rebuilds a role from persisted values.
    pub fn from_stored(
        id: CustomRoleId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: Option<String>,
        is_system: bool,
        can_be_deleted: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            display_name: NonEmptyString::new(display_name)?,
            description: normalize_description(description),
            is_system,
            can_be_deleted,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> CustomRoleId {
        self.id
    }

    /// Returns the catalog-unique name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the row is flagged as system-managed.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Returns whether the role may ever be deleted.
    #[must_use]
    pub fn can_be_deleted(&self) -> bool {
        self.can_be_deleted
    }

    /// Applies a partial update, validating every provided field first.
    pub fn apply_patch(&mut self, patch: CustomRolePatch) -> AppResult<()> {
        let display_name = patch.display_name.map(NonEmptyString::new).transpose()?;

        if let Some(display_name) = display_name {
            self.display_name = display_name;
        }
        if let Some(description) = patch.description {
            self.description = normalize_description(Some(description));
        }

        Ok(())
    }
}

fn normalize_role_name(value: String) -> AppResult<NonEmptyString> {
    let name = NonEmptyString::new(value.to_ascii_uppercase())?;

    if name.as_str().len() > CUSTOM_ROLE_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "role name must be at most {CUSTOM_ROLE_NAME_MAX_LENGTH} characters"
        )));
    }

    if !name
        .as_str()
        .chars()
        .all(|character| character.is_ascii_alphanumeric() || character == '_')
    {
        return Err(AppError::Validation(format!(
            "role name '{name}' may only contain letters, digits and underscores"
        )));
    }

    if SystemRole::from_str(name.as_str()).is_ok() {
        return Err(AppError::RoleAlreadyExists(name.into()));
    }

    Ok(name)
}

fn normalize_description(value: Option<String>) -> Option<String> {
    value
        .map(|description| description.trim().to_owned())
        .filter(|description| !description.is_empty())
}

#[cfg(test)]
mod tests {
    use hectara_core::AppError;

    use super::{CustomRole, CustomRolePatch};

    #[test]
    fn new_role_is_deletable_and_not_system() {
        let role = CustomRole::new("auditor", "Auditor", None).unwrap_or_else(|_| unreachable!());
        assert_eq!(role.name().as_str(), "AUDITOR");
        assert!(role.can_be_deleted());
        assert!(!role.is_system());
    }

    #[test]
    fn role_name_cannot_shadow_system_role() {
        let result = CustomRole::new("org_admin", "Org admin", None);
        assert!(matches!(result, Err(AppError::RoleAlreadyExists(name)) if name == "ORG_ADMIN"));
    }

    #[test]
    fn role_name_rejects_separators() {
        assert!(CustomRole::new("field lead", "Field lead", None).is_err());
    }

    #[test]
    fn patch_keeps_unspecified_fields() {
        let mut role = CustomRole::new("AUDITOR", "Auditor", Some("reads books".to_owned()))
            .unwrap_or_else(|_| unreachable!());

        let patched = role.apply_patch(CustomRolePatch {
            display_name: Some("External auditor".to_owned()),
            description: None,
        });

        assert!(patched.is_ok());
        assert_eq!(role.display_name().as_str(), "External auditor");
        assert_eq!(role.description(), Some("reads books"));
    }

    #[test]
    fn invalid_patch_leaves_role_unchanged() {
        let mut role = CustomRole::new("AUDITOR", "Auditor", Some("reads books".to_owned()))
            .unwrap_or_else(|_| unreachable!());

        let patched = role.apply_patch(CustomRolePatch {
            display_name: Some("  ".to_owned()),
            description: Some(String::new()),
        });

        assert!(patched.is_err());
        assert_eq!(role.display_name().as_str(), "Auditor");
        assert_eq!(role.description(), Some("reads books"));
    }
}
