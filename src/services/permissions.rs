//! Permission gate.
//!
//! Grants are per (user, model, permission) rows; admin callers bypass the
//! rows entirely. The engine never resolves identities itself: every check
//! takes a [`Caller`] the embedding application has already authenticated,
//! carrying the user id and two account-level flags.
//!
//! # Features
//!
//! - **Grant management**: grant, revoke, and list per-model permissions
//! - **Authorization checks**: boolean [`authorize`](PermissionService::authorize)
//!   plus a [`require`](PermissionService::require) form for API layers that
//!   want denial as an error
//! - **Admin bypass**: admin callers pass every check without a row lookup
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabula::{Caller, Permission, PermissionService, SqliteStore, UserId};
//!
//! let store = Arc::new(SqliteStore::in_memory()?);
//! let gate = PermissionService::new(store);
//!
//! let user = UserId::new();
//! gate.grant(user, invoice_id, Permission::ViewRecords)?;
//! gate.require(Caller::new(user), invoice_id, Permission::ViewRecords)?;
//! ```

use std::sync::Arc;

use crate::models::{Caller, ModelId, Permission, UserId, UserModelPermission};
use crate::storage::PermissionBackend;
use crate::{Error, Result};

/// Service answering "may this caller do that to this model".
///
/// Uses a [`PermissionBackend`] for grant storage.
pub struct PermissionService {
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionService {
    /// Creates a new permission service with the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Grant Administration
    // =========================================================================

    /// Grants a permission on a model to a user.
    ///
    /// Granting an already-held permission is a no-op that returns the
    /// existing grant.
    ///
    /// # Arguments
    ///
    /// * `user_id` - User receiving the grant
    /// * `model_id` - Model the grant applies to
    /// * `permission` - Action being granted
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model does not exist
    /// - Storage cannot be accessed
    pub fn grant(
        &self,
        user_id: UserId,
        model_id: ModelId,
        permission: Permission,
    ) -> Result<UserModelPermission> {
        let grant = self.backend.grant(user_id, model_id, permission)?;

        tracing::info!(
            user_id = %user_id,
            model_id = %model_id,
            permission = %permission,
            "Permission granted"
        );

        Ok(grant)
    }

    /// Revokes a permission. Returns true when a grant was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the model does not exist or storage cannot be
    /// accessed.
    pub fn revoke(
        &self,
        user_id: UserId,
        model_id: ModelId,
        permission: Permission,
    ) -> Result<bool> {
        let removed = self.backend.revoke(user_id, model_id, permission)?;

        if removed {
            tracing::info!(
                user_id = %user_id,
                model_id = %model_id,
                permission = %permission,
                "Permission revoked"
            );
        }

        Ok(removed)
    }

    /// Lists every grant a user holds, across all models.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn permissions_for(&self, user_id: UserId) -> Result<Vec<UserModelPermission>> {
        self.backend.permissions_for(user_id)
    }

    // =========================================================================
    // Authorization Checks
    // =========================================================================

    /// Returns true when the caller may perform the action on the model.
    ///
    /// Admins are authorized unconditionally; everyone else needs a grant.
    /// Denial is `Ok(false)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage cannot be accessed.
    pub fn authorize(
        &self,
        caller: Caller,
        model_id: ModelId,
        permission: Permission,
    ) -> Result<bool> {
        if caller.is_admin {
            return Ok(true);
        }
        self.backend
            .has_permission(caller.user_id, model_id, permission)
    }

    /// Like [`authorize`](Self::authorize), but denial becomes
    /// [`Error::AccessDenied`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller lacks the permission
    /// - Storage cannot be accessed
    pub fn require(&self, caller: Caller, model_id: ModelId, permission: Permission) -> Result<()> {
        if self.authorize(caller, model_id, permission)? {
            Ok(())
        } else {
            Err(Error::AccessDenied {
                user_id: caller.user_id,
                model_id,
                permission,
            })
        }
    }

    /// Returns true when the caller may create models.
    ///
    /// The right comes from the caller's account flags; no grant rows are
    /// involved.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn can_create_models(&self, caller: Caller) -> bool {
        caller.is_admin || caller.can_create_models
    }

    /// Like [`can_create_models`](Self::can_create_models), but denial
    /// becomes [`Error::ModelCreationDenied`].
    ///
    /// # Errors
    ///
    /// Returns an error if the caller may not create models.
    pub fn require_model_creation(&self, caller: Caller) -> Result<()> {
        if self.can_create_models(caller) {
            Ok(())
        } else {
            Err(Error::ModelCreationDenied(caller.user_id))
        }
    }
}
