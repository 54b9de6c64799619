//! Record backend over per-model record tables.
//!
//! Payloads are validated against the model's field definitions before any
//! SQL runs; values then travel as bound parameters into the model's record
//! table. Searches compile to one COUNT and one page SELECT under the same
//! connection lock, so the total always agrees with the page.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, params, params_from_iter};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::instrument;

use crate::models::{
    Field, FieldValue, MAX_PAGE_SIZE, ModelId, ModelLinkId, Record, RecordId, RecordPage,
    RecordQuery,
};
use crate::storage::traits::RecordBackend;
use crate::{Error, Result};

use super::schema::{count_rows, load_model_fields, require_model};
use super::sql::{
    build_filter_clause, build_order_clause, field_column, field_value_from_sql, format_timestamp,
    parse_timestamp, parse_uuid, record_links_table, records_table, sql_value,
};
use super::{SqliteStore, acquire_lock, in_transaction, record_operation_metrics, storage_error};

/// Checks a payload against the model's fields and converts the values.
///
/// Returns the affected fields in definition order. With `require_all` set
/// (record creation) every required field must carry a non-null value. A
/// JSON null is rejected on required fields in both modes; on optional
/// fields it is dropped at creation and marks a clear (`None`) on update.
fn validate_values<'a>(
    fields: &'a [Field],
    values: &JsonMap<String, JsonValue>,
    require_all: bool,
) -> Result<Vec<(&'a Field, Option<FieldValue>)>> {
    for name in values.keys() {
        if !fields.iter().any(|f| f.name == *name) {
            return Err(Error::UnknownField { field: name.clone() });
        }
    }

    let mut validated = Vec::new();
    for field in fields {
        match values.get(&field.name) {
            None => {
                if require_all && field.is_required {
                    return Err(Error::MissingRequiredField {
                        field: field.name.clone(),
                    });
                }
            }
            Some(JsonValue::Null) => {
                if field.is_required {
                    return Err(Error::MissingRequiredField {
                        field: field.name.clone(),
                    });
                }
                if !require_all {
                    validated.push((field, None));
                }
            }
            Some(value) => {
                let converted =
                    FieldValue::from_json(field.field_type, value).map_err(|reason| {
                        Error::InvalidFieldValue {
                            field: field.name.clone(),
                            reason,
                        }
                    })?;
                validated.push((field, Some(converted)));
            }
        }
    }
    Ok(validated)
}

/// Builds the SELECT column list for a record row: the fixed columns first,
/// then one column per field in definition order.
fn record_select(fields: &[Field]) -> String {
    let mut columns = String::from("id, created_at, updated_at");
    for field in fields {
        columns.push_str(", ");
        columns.push_str(&field_column(field.id));
    }
    columns
}

fn record_from_row(
    model_id: ModelId,
    fields: &[Field],
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<Record> {
    let id = RecordId::from_uuid(parse_uuid(0, &row.get::<_, String>(0)?)?);
    let created_at = parse_timestamp(1, &row.get::<_, String>(1)?)?;
    let updated_at = parse_timestamp(2, &row.get::<_, String>(2)?)?;

    let mut values = BTreeMap::new();
    for (offset, field) in fields.iter().enumerate() {
        let idx = 3 + offset;
        let raw: SqlValue = row.get(idx)?;
        if let Some(value) = field_value_from_sql(field, idx, raw)? {
            values.insert(field.name.clone(), value);
        }
    }

    Ok(Record {
        id,
        model_id,
        values,
        created_at,
        updated_at,
    })
}

fn load_record(
    conn: &rusqlite::Connection,
    model_id: ModelId,
    fields: &[Field],
    record_id: RecordId,
) -> Result<Record> {
    conn.query_row(
        &format!(
            "SELECT {} FROM {} WHERE id = ?1",
            record_select(fields),
            records_table(model_id)
        ),
        params![record_id.to_string()],
        |row| record_from_row(model_id, fields, row),
    )
    .optional()
    .map_err(|e| storage_error("get_record", e))?
    .ok_or(Error::RecordNotFound(record_id))
}

impl RecordBackend for SqliteStore {
    #[instrument(skip(self, values), fields(operation = "create_record", backend = "sqlite", model.id = %model_id))]
    fn create_record(
        &self,
        model_id: ModelId,
        values: &JsonMap<String, JsonValue>,
    ) -> Result<RecordId> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(self.connection());
            in_transaction(&conn, |conn| {
                require_model(conn, model_id)?;
                let fields = load_model_fields(conn, model_id)?;
                let validated = validate_values(&fields, values, true)?;

                let record_id = RecordId::new();
                let mut columns = String::from("id, created_at, updated_at");
                let mut placeholders = String::from("?1, ?2, ?2");
                let mut params_vec: Vec<SqlValue> = vec![
                    SqlValue::Text(record_id.to_string()),
                    SqlValue::Text(format_timestamp(&Utc::now())),
                ];
                let mut next = 3;
                for (field, value) in &validated {
                    if let Some(value) = value {
                        columns.push_str(", ");
                        columns.push_str(&field_column(field.id));
                        placeholders.push_str(&format!(", ?{next}"));
                        params_vec.push(sql_value(value));
                        next += 1;
                    }
                }

                conn.execute(
                    &format!(
                        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
                        records_table(model_id)
                    ),
                    params_from_iter(params_vec),
                )
                .map_err(|e| storage_error("insert_record", e))?;

                Ok(record_id)
            })
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "create_record", start, status);
        result
    }

    #[instrument(skip(self), fields(operation = "get_record", backend = "sqlite", record.id = %record_id))]
    fn get_record(&self, model_id: ModelId, record_id: RecordId) -> Result<Record> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(self.connection());
            require_model(&conn, model_id)?;
            let fields = load_model_fields(&conn, model_id)?;
            load_record(&conn, model_id, &fields, record_id)
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "get_record", start, status);
        result
    }

    #[instrument(skip(self, values), fields(operation = "update_record", backend = "sqlite", record.id = %record_id))]
    fn update_record(
        &self,
        model_id: ModelId,
        record_id: RecordId,
        values: &JsonMap<String, JsonValue>,
    ) -> Result<Record> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(self.connection());
            in_transaction(&conn, |conn| {
                require_model(conn, model_id)?;
                let fields = load_model_fields(conn, model_id)?;
                let validated = validate_values(&fields, values, false)?;
                if validated.is_empty() {
                    return load_record(conn, model_id, &fields, record_id);
                }

                let mut assignments = vec!["updated_at = ?1".to_string()];
                let mut params_vec: Vec<SqlValue> =
                    vec![SqlValue::Text(format_timestamp(&Utc::now()))];
                let mut next = 2;
                for (field, value) in &validated {
                    assignments.push(format!("{} = ?{next}", field_column(field.id)));
                    params_vec.push(value.as_ref().map_or(SqlValue::Null, sql_value));
                    next += 1;
                }
                params_vec.push(SqlValue::Text(record_id.to_string()));

                let changed = conn
                    .execute(
                        &format!(
                            "UPDATE {} SET {} WHERE id = ?{next}",
                            records_table(model_id),
                            assignments.join(", ")
                        ),
                        params_from_iter(params_vec),
                    )
                    .map_err(|e| storage_error("update_record", e))?;
                if changed == 0 {
                    return Err(Error::RecordNotFound(record_id));
                }

                load_record(conn, model_id, &fields, record_id)
            })
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "update_record", start, status);
        result
    }

    #[instrument(skip(self), fields(operation = "delete_record", backend = "sqlite", record.id = %record_id))]
    fn delete_record(&self, model_id: ModelId, record_id: RecordId) -> Result<()> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(self.connection());
            in_transaction(&conn, |conn| {
                require_model(conn, model_id)?;

                let removed = conn
                    .execute(
                        &format!("DELETE FROM {} WHERE id = ?1", records_table(model_id)),
                        params![record_id.to_string()],
                    )
                    .map_err(|e| storage_error("delete_record", e))?;
                if removed == 0 {
                    return Err(Error::RecordNotFound(record_id));
                }

                // Clear the record's edges in every link touching the model,
                // on whichever side the model occupies.
                let model_text = model_id.to_string();
                let mut stmt = conn
                    .prepare(
                        "SELECT id, model_1_id FROM model_links
                         WHERE model_1_id = ?1 OR model_2_id = ?1",
                    )
                    .map_err(|e| storage_error("list_touching_links", e))?;
                let sides = stmt
                    .query_map(params![model_text], |row| {
                        let link_text: String = row.get(0)?;
                        let model_1_text: String = row.get(1)?;
                        Ok((
                            ModelLinkId::from_uuid(parse_uuid(0, &link_text)?),
                            model_1_text,
                        ))
                    })
                    .map_err(|e| storage_error("list_touching_links", e))?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(|e| storage_error("list_touching_links", e))?;

                for (link_id, model_1_text) in sides {
                    let column = if model_1_text == model_text {
                        "record_1_id"
                    } else {
                        "record_2_id"
                    };
                    conn.execute(
                        &format!(
                            "DELETE FROM {} WHERE {column} = ?1",
                            record_links_table(link_id)
                        ),
                        params![record_id.to_string()],
                    )
                    .map_err(|e| storage_error("delete_record_edges", e))?;
                }

                Ok(())
            })
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "delete_record", start, status);
        result
    }

    #[instrument(skip(self), fields(operation = "count_records", backend = "sqlite", model.id = %model_id))]
    fn count_records(&self, model_id: ModelId) -> Result<u64> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(self.connection());
            require_model(&conn, model_id)?;
            count_rows(&conn, &records_table(model_id))
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "count_records", start, status);
        result
    }

    #[instrument(skip(self, query), fields(operation = "search_records", backend = "sqlite", model.id = %model_id))]
    fn search_records(&self, model_id: ModelId, query: &RecordQuery) -> Result<RecordPage> {
        let start = Instant::now();
        let result = (|| {
            let limit = query.page.limit;
            if limit == 0 || limit > MAX_PAGE_SIZE {
                return Err(Error::InvalidPageSize {
                    limit,
                    max: MAX_PAGE_SIZE,
                });
            }

            let conn = acquire_lock(self.connection());
            require_model(&conn, model_id)?;
            let fields = load_model_fields(&conn, model_id)?;
            let table = records_table(model_id);

            let (filter_clause, filter_params, next_param) =
                build_filter_clause(&fields, &query.filters, 1)?;
            let order_clause = build_order_clause(&fields, &query.sort)?;

            // The lock is held across both statements, so the total and the
            // page always describe the same table state.
            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {table}{filter_clause}"),
                    params_from_iter(filter_params.clone()),
                    |row| row.get(0),
                )
                .map_err(|e| storage_error("count_search_results", e))?;

            let mut page_params = filter_params;
            page_params.push(SqlValue::Integer(i64::from(limit)));
            #[allow(clippy::cast_possible_wrap)]
            page_params.push(SqlValue::Integer(query.page.offset as i64));

            let sql = format!(
                "SELECT {} FROM {table}{filter_clause}{order_clause} LIMIT ?{next_param} OFFSET ?{}",
                record_select(&fields),
                next_param + 1
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| storage_error("search_records", e))?;
            let records = stmt
                .query_map(params_from_iter(page_params), |row| {
                    record_from_row(model_id, &fields, row)
                })
                .map_err(|e| storage_error("search_records", e))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| storage_error("search_records", e))?;

            #[allow(clippy::cast_sign_loss)]
            Ok(RecordPage {
                records,
                total: total as u64,
                offset: query.page.offset,
                limit,
            })
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "search_records", start, status);
        result
    }
}
