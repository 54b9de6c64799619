//! Permission backend over the catalog.

use rusqlite::{Connection, OptionalExtension, params};

use crate::Result;
use crate::models::{ModelId, Permission, PermissionId, UserId, UserModelPermission};
use crate::storage::traits::PermissionBackend;

use super::schema::require_model;
use super::sql::{format_timestamp, parse_timestamp, parse_uuid};
use super::{SqliteStore, acquire_lock, in_transaction, storage_error};

const GRANT_COLUMNS: &str = "id, user_id, model_id, permission, created_at";

fn grant_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserModelPermission> {
    let permission_text: String = row.get(3)?;
    let permission = Permission::parse(&permission_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown permission: {permission_text}").into(),
        )
    })?;
    Ok(UserModelPermission {
        id: PermissionId::from_uuid(parse_uuid(0, &row.get::<_, String>(0)?)?),
        user_id: UserId::from_uuid(parse_uuid(1, &row.get::<_, String>(1)?)?),
        model_id: ModelId::from_uuid(parse_uuid(2, &row.get::<_, String>(2)?)?),
        permission,
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
    })
}

fn find_grant(
    conn: &Connection,
    user_id: UserId,
    model_id: ModelId,
    permission: Permission,
) -> Result<Option<UserModelPermission>> {
    conn.query_row(
        &format!(
            "SELECT {GRANT_COLUMNS} FROM user_model_permissions
             WHERE user_id = ?1 AND model_id = ?2 AND permission = ?3"
        ),
        params![
            user_id.to_string(),
            model_id.to_string(),
            permission.as_str()
        ],
        grant_from_row,
    )
    .optional()
    .map_err(|e| storage_error("find_grant", e))
}

impl PermissionBackend for SqliteStore {
    fn grant(
        &self,
        user_id: UserId,
        model_id: ModelId,
        permission: Permission,
    ) -> Result<UserModelPermission> {
        let conn = acquire_lock(self.connection());
        in_transaction(&conn, |conn| {
            require_model(conn, model_id)?;

            // Granting twice is a no-op returning the original grant.
            if let Some(existing) = find_grant(conn, user_id, model_id, permission)? {
                return Ok(existing);
            }

            let grant = UserModelPermission::new(user_id, model_id, permission);
            conn.execute(
                &format!(
                    "INSERT INTO user_model_permissions ({GRANT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5)"
                ),
                params![
                    grant.id.to_string(),
                    grant.user_id.to_string(),
                    grant.model_id.to_string(),
                    grant.permission.as_str(),
                    format_timestamp(&grant.created_at),
                ],
            )
            .map_err(|e| storage_error("insert_grant", e))?;
            Ok(grant)
        })
    }

    fn revoke(&self, user_id: UserId, model_id: ModelId, permission: Permission) -> Result<bool> {
        let conn = acquire_lock(self.connection());
        require_model(&conn, model_id)?;

        let removed = conn
            .execute(
                "DELETE FROM user_model_permissions
                 WHERE user_id = ?1 AND model_id = ?2 AND permission = ?3",
                params![
                    user_id.to_string(),
                    model_id.to_string(),
                    permission.as_str()
                ],
            )
            .map_err(|e| storage_error("delete_grant", e))?;
        Ok(removed > 0)
    }

    fn has_permission(
        &self,
        user_id: UserId,
        model_id: ModelId,
        permission: Permission,
    ) -> Result<bool> {
        let conn = acquire_lock(self.connection());
        let held = conn
            .query_row(
                "SELECT 1 FROM user_model_permissions
                 WHERE user_id = ?1 AND model_id = ?2 AND permission = ?3",
                params![
                    user_id.to_string(),
                    model_id.to_string(),
                    permission.as_str()
                ],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| storage_error("has_permission", e))?
            .is_some();
        Ok(held)
    }

    fn permissions_for(&self, user_id: UserId) -> Result<Vec<UserModelPermission>> {
        let conn = acquire_lock(self.connection());
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {GRANT_COLUMNS} FROM user_model_permissions
                 WHERE user_id = ?1 ORDER BY rowid"
            ))
            .map_err(|e| storage_error("list_grants", e))?;
        let grants = stmt
            .query_map(params![user_id.to_string()], grant_from_row)
            .map_err(|e| storage_error("list_grants", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| storage_error("list_grants", e))?;
        Ok(grants)
    }
}
