//! Schema backend over the `SQLite` catalog.
//!
//! Every mutation here keeps two things in step inside one transaction: the
//! catalog row and the physical shape of the model's record table. Creating
//! a model creates its table, adding a field adds a column, converting a
//! field rewrites or re-checks stored values.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{
    Field, FieldId, FieldSpec, FieldType, FieldUpdate, Model, ModelId, ModelLinkId, ModelUpdate,
    UserId, validate_text,
};
use crate::storage::traits::SchemaBackend;
use crate::{Error, Result};

use super::sql::{
    column_type, field_column, format_timestamp, parse_timestamp, parse_uuid, record_links_table,
    records_table,
};
use super::{SqliteStore, acquire_lock, in_transaction, storage_error};

pub(super) const MODEL_COLUMNS: &str = "id, name, description, owner, created_at, updated_at";
pub(super) const FIELD_COLUMNS: &str =
    "id, model_id, name, description, field_type, is_parent, is_required, created_at, updated_at";

pub(super) fn model_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Model> {
    Ok(Model {
        id: ModelId::from_uuid(parse_uuid(0, &row.get::<_, String>(0)?)?),
        name: row.get(1)?,
        description: row.get(2)?,
        owner: UserId::from_uuid(parse_uuid(3, &row.get::<_, String>(3)?)?),
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
        updated_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
    })
}

pub(super) fn field_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Field> {
    let type_text: String = row.get(4)?;
    let field_type = FieldType::parse(&type_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown field type: {type_text}").into(),
        )
    })?;
    Ok(Field {
        id: FieldId::from_uuid(parse_uuid(0, &row.get::<_, String>(0)?)?),
        model_id: ModelId::from_uuid(parse_uuid(1, &row.get::<_, String>(1)?)?),
        name: row.get(2)?,
        description: row.get(3)?,
        field_type,
        is_parent: row.get(5)?,
        is_required: row.get(6)?,
        created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
    })
}

pub(super) fn load_model(conn: &Connection, model_id: ModelId) -> Result<Model> {
    conn.query_row(
        &format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = ?1"),
        params![model_id.to_string()],
        model_from_row,
    )
    .optional()
    .map_err(|e| storage_error("get_model", e))?
    .ok_or(Error::ModelNotFound(model_id))
}

pub(super) fn require_model(conn: &Connection, model_id: ModelId) -> Result<()> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM models WHERE id = ?1",
            params![model_id.to_string()],
            |_| Ok(()),
        )
        .optional()
        .map_err(|e| storage_error("model_exists", e))?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(Error::ModelNotFound(model_id))
    }
}

pub(super) fn load_field(conn: &Connection, field_id: FieldId) -> Result<Field> {
    conn.query_row(
        &format!("SELECT {FIELD_COLUMNS} FROM fields WHERE id = ?1"),
        params![field_id.to_string()],
        field_from_row,
    )
    .optional()
    .map_err(|e| storage_error("get_field", e))?
    .ok_or(Error::FieldNotFound(field_id))
}

/// Loads a model's fields in creation order (rowid order, so timestamp ties
/// cannot reorder them).
pub(super) fn load_model_fields(conn: &Connection, model_id: ModelId) -> Result<Vec<Field>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {FIELD_COLUMNS} FROM fields WHERE model_id = ?1 ORDER BY rowid"
        ))
        .map_err(|e| storage_error("load_fields", e))?;
    let fields = stmt
        .query_map(params![model_id.to_string()], field_from_row)
        .map_err(|e| storage_error("load_fields", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| storage_error("load_fields", e))?;
    Ok(fields)
}

pub(super) fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .map_err(|e| storage_error("count_rows", e))?;
    #[allow(clippy::cast_sign_loss)]
    Ok(count as u64)
}

fn field_name_taken(conn: &Connection, model_id: ModelId, name: &str) -> Result<bool> {
    let taken = conn
        .query_row(
            "SELECT 1 FROM fields WHERE model_id = ?1 AND name = ?2",
            params![model_id.to_string(), name],
            |_| Ok(()),
        )
        .optional()
        .map_err(|e| storage_error("check_field_name", e))?
        .is_some();
    Ok(taken)
}

/// Converts the stored values of a column to a new field type.
///
/// Allowed conversions never change the column's storage class, so the
/// column itself stays in place. Stricter text targets re-check every
/// stored value; `Date` to `DateTime` rewrites values to midnight UTC.
fn convert_column(
    conn: &Connection,
    field: &Field,
    target: FieldType,
    table: &str,
    column: &str,
) -> Result<()> {
    if !field.field_type.is_convertible_to(target) {
        return Err(Error::IncompatibleFieldChange {
            field: field.name.clone(),
            reason: format!("stored {} values cannot become {target}", field.field_type),
        });
    }

    if matches!(target, FieldType::SingleLineText | FieldType::Email) {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {column} FROM {table} WHERE {column} IS NOT NULL"
            ))
            .map_err(|e| storage_error("scan_field_values", e))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| storage_error("scan_field_values", e))?;
        while let Some(row) = rows
            .next()
            .map_err(|e| storage_error("scan_field_values", e))?
        {
            let text: String = row
                .get(0)
                .map_err(|e| storage_error("scan_field_values", e))?;
            validate_text(target, &text).map_err(|reason| Error::IncompatibleFieldChange {
                field: field.name.clone(),
                reason,
            })?;
        }
    }

    if field.field_type == FieldType::Date && target == FieldType::DateTime {
        conn.execute(
            &format!(
                "UPDATE {table} SET {column} = {column} || 'T00:00:00.000000Z'
                 WHERE {column} IS NOT NULL"
            ),
            [],
        )
        .map_err(|e| storage_error("widen_date_column", e))?;
    }

    Ok(())
}

impl SchemaBackend for SqliteStore {
    fn create_model(&self, name: &str, description: &str, owner: UserId) -> Result<Model> {
        let conn = acquire_lock(self.connection());
        let model = Model::new(name, description, owner);
        in_transaction(&conn, |conn| {
            conn.execute(
                &format!("INSERT INTO models ({MODEL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    model.id.to_string(),
                    model.name,
                    model.description,
                    model.owner.to_string(),
                    format_timestamp(&model.created_at),
                    format_timestamp(&model.updated_at),
                ],
            )
            .map_err(|e| storage_error("insert_model", e))?;

            conn.execute(
                &format!(
                    "CREATE TABLE {} (
                        id TEXT PRIMARY KEY,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL
                    )",
                    records_table(model.id)
                ),
                [],
            )
            .map_err(|e| storage_error("create_records_table", e))?;
            Ok(())
        })?;
        Ok(model)
    }

    fn get_model(&self, model_id: ModelId) -> Result<Model> {
        let conn = acquire_lock(self.connection());
        load_model(&conn, model_id)
    }

    fn list_models(&self) -> Result<Vec<Model>> {
        let conn = acquire_lock(self.connection());
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {MODEL_COLUMNS} FROM models ORDER BY rowid"
            ))
            .map_err(|e| storage_error("list_models", e))?;
        let models = stmt
            .query_map([], model_from_row)
            .map_err(|e| storage_error("list_models", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| storage_error("list_models", e))?;
        Ok(models)
    }

    fn update_model(&self, model_id: ModelId, update: &ModelUpdate) -> Result<Model> {
        let conn = acquire_lock(self.connection());
        in_transaction(&conn, |conn| {
            let mut model = load_model(conn, model_id)?;
            if update.is_empty() {
                return Ok(model);
            }
            if let Some(name) = &update.name {
                model.name.clone_from(name);
            }
            if let Some(description) = &update.description {
                model.description.clone_from(description);
            }
            model.updated_at = Utc::now();
            conn.execute(
                "UPDATE models SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    model.name,
                    model.description,
                    format_timestamp(&model.updated_at),
                    model_id.to_string(),
                ],
            )
            .map_err(|e| storage_error("update_model", e))?;
            Ok(model)
        })
    }

    fn delete_model(&self, model_id: ModelId) -> Result<()> {
        let conn = acquire_lock(self.connection());
        in_transaction(&conn, |conn| {
            require_model(conn, model_id)?;

            // Edge tables of every link touching the model go first, while
            // their catalog rows still name them.
            let mut stmt = conn
                .prepare("SELECT id FROM model_links WHERE model_1_id = ?1 OR model_2_id = ?1")
                .map_err(|e| storage_error("list_touching_links", e))?;
            let link_ids = stmt
                .query_map(params![model_id.to_string()], |row| {
                    let text: String = row.get(0)?;
                    Ok(ModelLinkId::from_uuid(parse_uuid(0, &text)?))
                })
                .map_err(|e| storage_error("list_touching_links", e))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| storage_error("list_touching_links", e))?;
            for link_id in link_ids {
                conn.execute(
                    &format!("DROP TABLE IF EXISTS {}", record_links_table(link_id)),
                    [],
                )
                .map_err(|e| storage_error("drop_record_links_table", e))?;
            }
            conn.execute(
                "DELETE FROM model_links WHERE model_1_id = ?1 OR model_2_id = ?1",
                params![model_id.to_string()],
            )
            .map_err(|e| storage_error("delete_model_links", e))?;

            conn.execute(
                &format!("DROP TABLE IF EXISTS {}", records_table(model_id)),
                [],
            )
            .map_err(|e| storage_error("drop_records_table", e))?;

            conn.execute(
                "DELETE FROM fields WHERE model_id = ?1",
                params![model_id.to_string()],
            )
            .map_err(|e| storage_error("delete_fields", e))?;
            conn.execute(
                "DELETE FROM user_model_permissions WHERE model_id = ?1",
                params![model_id.to_string()],
            )
            .map_err(|e| storage_error("delete_permissions", e))?;
            conn.execute(
                "DELETE FROM models WHERE id = ?1",
                params![model_id.to_string()],
            )
            .map_err(|e| storage_error("delete_model", e))?;
            Ok(())
        })
    }

    fn fields(&self, model_id: ModelId) -> Result<Vec<Field>> {
        let conn = acquire_lock(self.connection());
        require_model(&conn, model_id)?;
        load_model_fields(&conn, model_id)
    }

    fn get_field(&self, field_id: FieldId) -> Result<Field> {
        let conn = acquire_lock(self.connection());
        load_field(&conn, field_id)
    }

    fn add_field(&self, model_id: ModelId, spec: &FieldSpec) -> Result<Field> {
        let conn = acquire_lock(self.connection());
        in_transaction(&conn, |conn| {
            require_model(conn, model_id)?;

            if field_name_taken(conn, model_id, &spec.name)? {
                return Err(Error::InvalidName {
                    name: spec.name.clone(),
                    reason: "the model already has a field with this name".to_string(),
                });
            }

            let table = records_table(model_id);
            if spec.is_required && count_rows(conn, &table)? > 0 {
                return Err(Error::IncompatibleFieldChange {
                    field: spec.name.clone(),
                    reason: "cannot add a required field to a model that already has records"
                        .to_string(),
                });
            }

            let field = Field::new(model_id, spec);
            conn.execute(
                &format!(
                    "INSERT INTO fields ({FIELD_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    field.id.to_string(),
                    field.model_id.to_string(),
                    field.name,
                    field.description,
                    field.field_type.as_str(),
                    field.is_parent,
                    field.is_required,
                    format_timestamp(&field.created_at),
                    format_timestamp(&field.updated_at),
                ],
            )
            .map_err(|e| storage_error("insert_field", e))?;

            conn.execute(
                &format!(
                    "ALTER TABLE {table} ADD COLUMN {} {}",
                    field_column(field.id),
                    column_type(field.field_type)
                ),
                [],
            )
            .map_err(|e| storage_error("add_field_column", e))?;

            Ok(field)
        })
    }

    fn update_field(&self, field_id: FieldId, update: &FieldUpdate) -> Result<Field> {
        let conn = acquire_lock(self.connection());
        in_transaction(&conn, |conn| {
            let mut field = load_field(conn, field_id)?;
            let table = records_table(field.model_id);
            let column = field_column(field.id);

            if let Some(name) = &update.name {
                if *name != field.name {
                    if field_name_taken(conn, field.model_id, name)? {
                        return Err(Error::InvalidName {
                            name: name.clone(),
                            reason: "the model already has a field with this name".to_string(),
                        });
                    }
                    field.name.clone_from(name);
                }
            }
            if let Some(description) = &update.description {
                field.description.clone_from(description);
            }

            if let Some(target) = update.field_type {
                if target != field.field_type {
                    convert_column(conn, &field, target, &table, &column)?;
                    field.field_type = target;
                }
            }

            if let Some(is_parent) = update.is_parent {
                field.is_parent = is_parent;
            }

            if let Some(is_required) = update.is_required {
                if is_required && !field.is_required {
                    let missing: i64 = conn
                        .query_row(
                            &format!("SELECT COUNT(*) FROM {table} WHERE {column} IS NULL"),
                            [],
                            |row| row.get(0),
                        )
                        .map_err(|e| storage_error("scan_missing_values", e))?;
                    if missing > 0 {
                        return Err(Error::IncompatibleFieldChange {
                            field: field.name.clone(),
                            reason: format!("{missing} records have no value for this field"),
                        });
                    }
                }
                field.is_required = is_required;
            }

            field.updated_at = Utc::now();
            conn.execute(
                "UPDATE fields SET name = ?1, description = ?2, field_type = ?3,
                        is_parent = ?4, is_required = ?5, updated_at = ?6 WHERE id = ?7",
                params![
                    field.name,
                    field.description,
                    field.field_type.as_str(),
                    field.is_parent,
                    field.is_required,
                    format_timestamp(&field.updated_at),
                    field_id.to_string(),
                ],
            )
            .map_err(|e| storage_error("update_field", e))?;

            Ok(field)
        })
    }

    fn delete_field(&self, field_id: FieldId) -> Result<()> {
        let conn = acquire_lock(self.connection());
        in_transaction(&conn, |conn| {
            let field = load_field(conn, field_id)?;
            conn.execute(
                "DELETE FROM fields WHERE id = ?1",
                params![field_id.to_string()],
            )
            .map_err(|e| storage_error("delete_field", e))?;
            conn.execute(
                &format!(
                    "ALTER TABLE {} DROP COLUMN {}",
                    records_table(field.model_id),
                    field_column(field.id)
                ),
                [],
            )
            .map_err(|e| storage_error("drop_field_column", e))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    fn column_count(store: &SqliteStore, model_id: ModelId) -> i64 {
        let conn = acquire_lock(store.connection());
        conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM pragma_table_info('{}')",
                records_table(model_id)
            ),
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn insert_raw_record(store: &SqliteStore, model_id: ModelId, column: &str, value: &str) {
        let conn = acquire_lock(store.connection());
        conn.execute(
            &format!(
                "INSERT INTO {} (id, created_at, updated_at, {column}) VALUES (?1, ?2, ?2, ?3)",
                records_table(model_id)
            ),
            params![uuid::Uuid::new_v4().to_string(), "2025-01-01T00:00:00.000000Z", value],
        )
        .unwrap();
    }

    #[test]
    fn test_create_and_get_model() {
        let store = store();
        let owner = UserId::new();
        let model = store.create_model("Invoice", "Billing documents", owner).unwrap();

        let loaded = store.get_model(model.id).unwrap();
        assert_eq!(loaded.name, "Invoice");
        assert_eq!(loaded.description, "Billing documents");
        assert_eq!(loaded.owner, owner);
        assert_eq!(column_count(&store, model.id), 3);
    }

    #[test]
    fn test_get_model_not_found() {
        let store = store();
        let missing = ModelId::new();
        assert!(matches!(
            store.get_model(missing),
            Err(Error::ModelNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn test_list_models_in_creation_order() {
        let store = store();
        let owner = UserId::new();
        store.create_model("First", "", owner).unwrap();
        store.create_model("Second", "", owner).unwrap();

        let models = store.list_models().unwrap();
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_update_model_metadata() {
        let store = store();
        let model = store.create_model("Draft", "", UserId::new()).unwrap();

        let updated = store
            .update_model(model.id, &ModelUpdate::new().with_name("Invoice"))
            .unwrap();
        assert_eq!(updated.name, "Invoice");
        assert_eq!(updated.description, "");
        assert!(updated.updated_at >= model.updated_at);

        let unchanged = store.update_model(model.id, &ModelUpdate::new()).unwrap();
        assert_eq!(unchanged.name, "Invoice");
    }

    #[test]
    fn test_add_field_adds_column() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();

        let field = store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Number))
            .unwrap();
        assert_eq!(field.model_id, model.id);
        assert_eq!(column_count(&store, model.id), 4);

        let fields = store.fields(model.id).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "total");
    }

    #[test]
    fn test_add_field_rejects_duplicate_name() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Number))
            .unwrap();

        let err = store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Boolean))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName { .. }));

        // Field names are case-sensitive, so a different casing is fine.
        store
            .add_field(model.id, &FieldSpec::new("Total", FieldType::Boolean))
            .unwrap();
    }

    #[test]
    fn test_add_required_field_to_populated_model() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        let field = store
            .add_field(model.id, &FieldSpec::new("number", FieldType::SingleLineText))
            .unwrap();
        insert_raw_record(&store, model.id, &field_column(field.id), "INV-1");

        let err = store
            .add_field(
                model.id,
                &FieldSpec::new("due", FieldType::Date).required(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleFieldChange { .. }));

        // Optional fields can still be added.
        store
            .add_field(model.id, &FieldSpec::new("due", FieldType::Date))
            .unwrap();
    }

    #[test]
    fn test_update_field_rename_keeps_values_column() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        let field = store
            .add_field(model.id, &FieldSpec::new("number", FieldType::SingleLineText))
            .unwrap();
        insert_raw_record(&store, model.id, &field_column(field.id), "INV-1");

        let renamed = store
            .update_field(field.id, &FieldUpdate::new().with_name("invoice_number"))
            .unwrap();
        assert_eq!(renamed.name, "invoice_number");
        assert_eq!(renamed.id, field.id);

        // The physical column is keyed by the field id and is untouched.
        let conn = acquire_lock(store.connection());
        let value: String = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {}",
                    field_column(field.id),
                    records_table(model.id)
                ),
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(value, "INV-1");
    }

    #[test]
    fn test_update_field_rejects_taken_name() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Number))
            .unwrap();
        let other = store
            .add_field(model.id, &FieldSpec::new("tax", FieldType::Number))
            .unwrap();

        let err = store
            .update_field(other.id, &FieldUpdate::new().with_name("total"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName { .. }));
    }

    #[test]
    fn test_convert_multi_line_to_single_line() {
        let store = store();
        let model = store.create_model("Note", "", UserId::new()).unwrap();
        let field = store
            .add_field(model.id, &FieldSpec::new("body", FieldType::MultiLineText))
            .unwrap();
        insert_raw_record(&store, model.id, &field_column(field.id), "line one\nline two");

        let err = store
            .update_field(
                field.id,
                &FieldUpdate::new().with_field_type(FieldType::SingleLineText),
            )
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleFieldChange { .. }));

        // The failed conversion must leave the field untouched.
        let unchanged = store.get_field(field.id).unwrap();
        assert_eq!(unchanged.field_type, FieldType::MultiLineText);

        // Without line breaks the same conversion goes through.
        let conn = acquire_lock(store.connection());
        conn.execute(
            &format!(
                "UPDATE {} SET {} = 'single line'",
                records_table(model.id),
                field_column(field.id)
            ),
            [],
        )
        .unwrap();
        drop(conn);

        let converted = store
            .update_field(
                field.id,
                &FieldUpdate::new().with_field_type(FieldType::SingleLineText),
            )
            .unwrap();
        assert_eq!(converted.field_type, FieldType::SingleLineText);
    }

    #[test]
    fn test_convert_text_to_email_checks_values() {
        let store = store();
        let model = store.create_model("Contact", "", UserId::new()).unwrap();
        let field = store
            .add_field(model.id, &FieldSpec::new("mail", FieldType::SingleLineText))
            .unwrap();
        insert_raw_record(&store, model.id, &field_column(field.id), "not-an-address");

        let err = store
            .update_field(
                field.id,
                &FieldUpdate::new().with_field_type(FieldType::Email),
            )
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleFieldChange { .. }));
    }

    #[test]
    fn test_convert_date_to_datetime_rewrites_values() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        let field = store
            .add_field(model.id, &FieldSpec::new("due", FieldType::Date))
            .unwrap();
        insert_raw_record(&store, model.id, &field_column(field.id), "2025-03-01");

        let converted = store
            .update_field(
                field.id,
                &FieldUpdate::new().with_field_type(FieldType::DateTime),
            )
            .unwrap();
        assert_eq!(converted.field_type, FieldType::DateTime);

        let conn = acquire_lock(store.connection());
        let value: String = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {}",
                    field_column(field.id),
                    records_table(model.id)
                ),
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(value, "2025-03-01T00:00:00.000000Z");
    }

    #[test]
    fn test_convert_rejects_lossy_type_change() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        let field = store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Number))
            .unwrap();

        let err = store
            .update_field(
                field.id,
                &FieldUpdate::new().with_field_type(FieldType::SingleLineText),
            )
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleFieldChange { .. }));
    }

    #[test]
    fn test_make_field_required_scans_for_missing_values() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        let number = store
            .add_field(model.id, &FieldSpec::new("number", FieldType::SingleLineText))
            .unwrap();
        let total = store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Number))
            .unwrap();
        insert_raw_record(&store, model.id, &field_column(number.id), "INV-1");

        // "total" is NULL on the existing record.
        let err = store
            .update_field(total.id, &FieldUpdate::new().with_is_required(true))
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleFieldChange { .. }));

        // "number" has a value everywhere.
        let required = store
            .update_field(number.id, &FieldUpdate::new().with_is_required(true))
            .unwrap();
        assert!(required.is_required);
    }

    #[test]
    fn test_delete_field_drops_column() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        let field = store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Number))
            .unwrap();
        assert_eq!(column_count(&store, model.id), 4);

        store.delete_field(field.id).unwrap();
        assert_eq!(column_count(&store, model.id), 3);
        assert!(matches!(
            store.get_field(field.id),
            Err(Error::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_delete_model_removes_catalog_and_table() {
        let store = store();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        let field = store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Number))
            .unwrap();

        store.delete_model(model.id).unwrap();

        assert!(matches!(
            store.get_model(model.id),
            Err(Error::ModelNotFound(_))
        ));
        assert!(matches!(
            store.get_field(field.id),
            Err(Error::FieldNotFound(_))
        ));

        let conn = acquire_lock(store.connection());
        let table_exists: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![records_table(model.id)],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n > 0)
            .unwrap();
        assert!(!table_exists);
    }

    #[test]
    fn test_delete_missing_model() {
        let store = store();
        assert!(matches!(
            store.delete_model(ModelId::new()),
            Err(Error::ModelNotFound(_))
        ));
    }
}
