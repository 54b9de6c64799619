//! Permission storage trait definitions.

use crate::Result;
use crate::models::{ModelId, Permission, UserId, UserModelPermission};

/// Trait for permission storage backends.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait PermissionBackend: Send + Sync {
    /// Grants a permission on a model. Granting an already-held permission
    /// returns the existing grant unchanged.
    fn grant(&self, user_id: UserId, model_id: ModelId, permission: Permission)
    -> Result<UserModelPermission>;

    /// Revokes a permission. Returns true when a grant was removed.
    fn revoke(&self, user_id: UserId, model_id: ModelId, permission: Permission) -> Result<bool>;

    /// Returns true when the user holds the permission on the model.
    fn has_permission(
        &self,
        user_id: UserId,
        model_id: ModelId,
        permission: Permission,
    ) -> Result<bool>;

    /// Lists every grant held by a user.
    fn permissions_for(&self, user_id: UserId) -> Result<Vec<UserModelPermission>>;
}
