//! Per-model permissions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ModelId, PermissionId, UserId};

/// An action a user may be granted on a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read records and search.
    ViewRecords,
    /// Create records.
    AddRecords,
    /// Update existing records.
    EditRecords,
    /// Delete records.
    DeleteRecords,
    /// Add fields to the model.
    AddFields,
    /// Remove fields from the model.
    RemoveFields,
}

impl Permission {
    /// All permissions, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::ViewRecords,
        Self::AddRecords,
        Self::EditRecords,
        Self::DeleteRecords,
        Self::AddFields,
        Self::RemoveFields,
    ];

    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ViewRecords => "view_records",
            Self::AddRecords => "add_records",
            Self::EditRecords => "edit_records",
            Self::DeleteRecords => "delete_records",
            Self::AddFields => "add_fields",
            Self::RemoveFields => "remove_fields",
        }
    }

    /// Parses a permission from its string form (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "view_records" => Some(Self::ViewRecords),
            "add_records" => Some(Self::AddRecords),
            "edit_records" => Some(Self::EditRecords),
            "delete_records" => Some(Self::DeleteRecords),
            "add_fields" => Some(Self::AddFields),
            "remove_fields" => Some(Self::RemoveFields),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown permission: {s}"))
    }
}

/// A granted permission on one model for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserModelPermission {
    /// Unique identifier of the grant.
    pub id: PermissionId,
    /// User the grant applies to.
    pub user_id: UserId,
    /// Model the grant applies to.
    pub model_id: ModelId,
    /// Granted action.
    pub permission: Permission,
    /// Grant time.
    pub created_at: DateTime<Utc>,
}

impl UserModelPermission {
    /// Creates a grant with a fresh identifier.
    #[must_use]
    pub fn new(user_id: UserId, model_id: ModelId, permission: Permission) -> Self {
        Self {
            id: PermissionId::new(),
            user_id,
            model_id,
            permission,
            created_at: Utc::now(),
        }
    }
}

/// The identity on whose behalf an operation runs.
///
/// Admins bypass per-model permission checks entirely. Model creation is
/// controlled by a separate account-level flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Acting user.
    pub user_id: UserId,
    /// Whether the user bypasses permission checks.
    pub is_admin: bool,
    /// Whether the user may create new models.
    pub can_create_models: bool,
}

impl Caller {
    /// Creates a caller with no elevated rights.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
            can_create_models: false,
        }
    }

    /// Creates an admin caller.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
            can_create_models: true,
        }
    }

    /// Sets the model-creation flag.
    #[must_use]
    pub const fn with_can_create_models(mut self, allowed: bool) -> Self {
        self.can_create_models = allowed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Permission::ViewRecords, "view_records")]
    #[test_case(Permission::AddRecords, "add_records")]
    #[test_case(Permission::EditRecords, "edit_records")]
    #[test_case(Permission::DeleteRecords, "delete_records")]
    #[test_case(Permission::AddFields, "add_fields")]
    #[test_case(Permission::RemoveFields, "remove_fields")]
    fn test_permission_round_trip(permission: Permission, s: &str) {
        assert_eq!(permission.as_str(), s);
        assert_eq!(Permission::parse(s), Some(permission));
        assert_eq!(s.parse::<Permission>().ok(), Some(permission));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Permission::parse("drop_tables"), None);
        assert!("".parse::<Permission>().is_err());
    }

    #[test]
    fn test_caller_flags() {
        let user = UserId::new();
        let caller = Caller::new(user);
        assert!(!caller.is_admin);
        assert!(!caller.can_create_models);

        let admin = Caller::admin(user);
        assert!(admin.is_admin);
        assert!(admin.can_create_models);

        let creator = Caller::new(user).with_can_create_models(true);
        assert!(!creator.is_admin);
        assert!(creator.can_create_models);
    }
}
