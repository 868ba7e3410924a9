use std::fmt::{Display, Formatter};
use std::str::FromStr;

use hectara_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource families guarded by permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    /// Farms owned by an organization.
    Farm,
    /// Fields (plots) inside a farm.
    Field,
    /// Crop plans and plantings.
    Crop,
    /// Harvest records.
    Harvest,
    /// Stock and supplies.
    Inventory,
    /// Machinery and tools.
    Equipment,
    /// Sales and purchase invoices.
    Invoice,
    /// Cost centers used for accounting splits.
    CostCenter,
    /// Employee records.
    Employee,
    /// Application users.
    User,
    /// Roles and their grants.
    Role,
    /// Generated reports.
    Report,
}

impl ResourceType {
    /// Returns the stable storage tag for this resource type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farm => "FARM",
            Self::Field => "FIELD",
            Self::Crop => "CROP",
            Self::Harvest => "HARVEST",
            Self::Inventory => "INVENTORY",
            Self::Equipment => "EQUIPMENT",
            Self::Invoice => "INVOICE",
            Self::CostCenter => "COST_CENTER",
            Self::Employee => "EMPLOYEE",
            Self::User => "USER",
            Self::Role => "ROLE",
            Self::Report => "REPORT",
        }
    }

    /// Returns all known resource types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceType] = &[
            ResourceType::Farm,
            ResourceType::Field,
            ResourceType::Crop,
            ResourceType::Harvest,
            ResourceType::Inventory,
            ResourceType::Equipment,
            ResourceType::Invoice,
            ResourceType::CostCenter,
            ResourceType::Employee,
            ResourceType::User,
            ResourceType::Role,
            ResourceType::Report,
        ];

        ALL
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Farm => "farms",
            Self::Field => "fields",
            Self::Crop => "crops",
            Self::Harvest => "harvests",
            Self::Inventory => "inventory items",
            Self::Equipment => "equipment",
            Self::Invoice => "invoices",
            Self::CostCenter => "cost centers",
            Self::Employee => "employees",
            Self::User => "users",
            Self::Role => "roles",
            Self::Report => "reports",
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|resource_type| resource_type.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource type '{value}'")))
    }
}

/// Actions that can be performed on a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionAction {
    /// Read access.
    View,
    /// Creation of new rows.
    Create,
    /// Mutation of existing rows.
    Edit,
    /// Removal of rows.
    Delete,
}

impl PermissionAction {
    /// Returns the stable storage tag for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Create => "CREATE",
            Self::Edit => "EDIT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionAction] = &[
            PermissionAction::View,
            PermissionAction::Create,
            PermissionAction::Edit,
            PermissionAction::Delete,
        ];

        ALL
    }

    fn verb(&self) -> &'static str {
        match self {
            Self::View => "View",
            Self::Create => "Create",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
        }
    }
}

impl Display for PermissionAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "VIEW" => Ok(Self::View),
            "CREATE" => Ok(Self::Create),
            "EDIT" => Ok(Self::Edit),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown permission action '{value}'"
            ))),
        }
    }
}

/// The (resource type, action) pair a permission stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    /// Guarded resource family.
    pub resource_type: ResourceType,
    /// Guarded action.
    pub action: PermissionAction,
}

impl PermissionKey {
    /// Creates a key from its parts.
    #[must_use]
    pub fn new(resource_type: ResourceType, action: PermissionAction) -> Self {
        Self {
            resource_type,
            action,
        }
    }

    /// Parses raw transport tags, e.g. values derived from a route.
    pub fn parse(resource_type: &str, action: &str) -> AppResult<Self> {
        Ok(Self::new(
            ResourceType::from_str(resource_type)?,
            PermissionAction::from_str(action)?,
        ))
    }

    /// Returns every pair of the compiled resource type × action matrix.
    pub fn matrix() -> impl Iterator<Item = Self> {
        ResourceType::all().iter().flat_map(|resource_type| {
            PermissionAction::all()
                .iter()
                .map(|action| Self::new(*resource_type, *action))
        })
    }

    /// Returns the description used when seeding the catalog.
    #[must_use]
    pub fn default_description(&self) -> String {
        format!("{} {}", self.action.verb(), self.resource_type.label())
    }

    /// Returns the ordering used for stable catalog display.
    #[must_use]
    pub fn display_order(&self) -> (&'static str, &'static str) {
        (self.resource_type.as_str(), self.action.as_str())
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.resource_type, self.action)
    }
}

impl FromStr for PermissionKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (resource_type, action) = value.split_once(':').ok_or_else(|| {
            AppError::Validation(format!(
                "permission '{value}' must be formatted as '<RESOURCE_TYPE>:<ACTION>'"
            ))
        })?;

        Self::parse(resource_type, action)
    }
}

/// Stable identifier of a catalog permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a random permission identifier.
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

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for PermissionId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::UnknownPermission(value.to_owned()))
    }
}

/// One checkable capability registered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    key: PermissionKey,
    description: String,
}

impl Permission {
    /// Creates a permission with a fresh identifier.
    pub fn new(key: PermissionKey, description: impl Into<String>) -> AppResult<Self> {
        Self::from_stored(PermissionId::new(), key, description)
    }

    /// Rebuilds a permission from persisted values.
    pub fn from_stored(
        id: PermissionId,
        key: PermissionKey,
        description: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            key,
            description: Self::normalize_description(description.into().as_str())?,
        })
    }

    /// Trims and validates a description value.
    pub fn normalize_description(value: &str) -> AppResult<String> {
        let trimmed = value.trim();
        if trimmed.chars().count() > 255 {
            return Err(AppError::Validation(
                "permission description must be at most 255 characters".to_owned(),
            ));
        }

        Ok(trimmed.to_owned())
    }

    /// Returns the stable identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the (resource type, action) pair.
    #[must_use]
    pub fn key(&self) -> PermissionKey {
        self.key
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: impl Into<String>) -> AppResult<()> {
        self.description = Self::normalize_description(description.into().as_str())?;
        Ok(())
    }
}
