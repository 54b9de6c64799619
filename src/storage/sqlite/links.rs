//! Link backend over the catalog and per-link edge tables.
//!
//! A model link's catalog row carries its per-direction bounds; the actual
//! record pairs live in the link's own edge table. `record_1_id` always
//! holds records of the link's first model, so cardinality checks are plain
//! per-column counts.

use std::time::Instant;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::instrument;

use crate::models::{
    Cardinality, CardinalitySpec, ModelId, ModelLink, ModelLinkId, ModelLinkView, RecordId,
    RecordLink, RecordLinkId,
};
use crate::storage::traits::LinkBackend;
use crate::{Error, Result};

use super::schema::require_model;
use super::sql::{format_timestamp, parse_timestamp, parse_uuid, record_links_table, records_table};
use super::{SqliteStore, acquire_lock, in_transaction, record_operation_metrics, storage_error};

const LINK_COLUMNS: &str = "id, model_1_id, model_2_id, model1_unlimited, model1_bound, \
                            model2_unlimited, model2_bound, created_at, updated_at";

fn cardinality_from_columns(unlimited: bool, bound: Option<i64>) -> Cardinality {
    match (unlimited, bound) {
        (true, _) => Cardinality::Unlimited,
        #[allow(clippy::cast_sign_loss)]
        (false, Some(n)) if n >= 0 => Cardinality::AtMost(n as u64),
        // The CHECK constraints forbid these shapes; read them as the most
        // restrictive bound rather than guessing.
        (false, _) => Cardinality::AtMost(0),
    }
}

fn cardinality_columns(cardinality: Cardinality) -> (bool, Option<i64>) {
    match cardinality {
        Cardinality::Unlimited => (true, None),
        Cardinality::AtMost(bound) => (false, Some(i64::try_from(bound).unwrap_or(i64::MAX))),
    }
}

fn model_link_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModelLink> {
    let m1_unlimited: bool = row.get(3)?;
    let m1_bound: Option<i64> = row.get(4)?;
    let m2_unlimited: bool = row.get(5)?;
    let m2_bound: Option<i64> = row.get(6)?;
    Ok(ModelLink {
        id: ModelLinkId::from_uuid(parse_uuid(0, &row.get::<_, String>(0)?)?),
        model_1_id: ModelId::from_uuid(parse_uuid(1, &row.get::<_, String>(1)?)?),
        model_2_id: ModelId::from_uuid(parse_uuid(2, &row.get::<_, String>(2)?)?),
        cardinality: CardinalitySpec::new(
            cardinality_from_columns(m1_unlimited, m1_bound),
            cardinality_from_columns(m2_unlimited, m2_bound),
        ),
        created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
    })
}

fn record_link_from_row(
    link_id: ModelLinkId,
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RecordLink> {
    Ok(RecordLink {
        id: RecordLinkId::from_uuid(parse_uuid(0, &row.get::<_, String>(0)?)?),
        model_link_id: link_id,
        record_1_id: RecordId::from_uuid(parse_uuid(1, &row.get::<_, String>(1)?)?),
        record_2_id: RecordId::from_uuid(parse_uuid(2, &row.get::<_, String>(2)?)?),
        created_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
    })
}

pub(super) fn load_model_link(conn: &Connection, link_id: ModelLinkId) -> Result<ModelLink> {
    conn.query_row(
        &format!("SELECT {LINK_COLUMNS} FROM model_links WHERE id = ?1"),
        params![link_id.to_string()],
        model_link_from_row,
    )
    .optional()
    .map_err(|e| storage_error("get_model_link", e))?
    .ok_or(Error::ModelLinkNotFound(link_id))
}

fn record_exists(conn: &Connection, table: &str, record_id: RecordId) -> Result<bool> {
    let exists = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            params![record_id.to_string()],
            |_| Ok(()),
        )
        .optional()
        .map_err(|e| storage_error("record_exists", e))?
        .is_some();
    Ok(exists)
}

fn count_edges(conn: &Connection, table: &str, column: &str, record_id: RecordId) -> Result<u64> {
    let count: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
            params![record_id.to_string()],
            |row| row.get(0),
        )
        .map_err(|e| storage_error("count_record_links", e))?;
    #[allow(clippy::cast_sign_loss)]
    Ok(count as u64)
}

/// Largest number of edges any single record currently holds on one side.
fn max_edges_per_record(conn: &Connection, table: &str, column: &str) -> Result<u64> {
    let max: i64 = conn
        .query_row(
            &format!(
                "SELECT COALESCE(MAX(c), 0)
                 FROM (SELECT COUNT(*) AS c FROM {table} GROUP BY {column})"
            ),
            [],
            |row| row.get(0),
        )
        .map_err(|e| storage_error("count_record_links", e))?;
    #[allow(clippy::cast_sign_loss)]
    Ok(max as u64)
}

impl LinkBackend for SqliteStore {
    fn create_model_link(
        &self,
        model_1_id: ModelId,
        model_2_id: ModelId,
        cardinality: CardinalitySpec,
    ) -> Result<ModelLink> {
        let conn = acquire_lock(self.connection());
        in_transaction(&conn, |conn| {
            if model_1_id == model_2_id {
                return Err(Error::SelfLink(model_1_id));
            }
            require_model(conn, model_1_id)?;
            require_model(conn, model_2_id)?;

            let linked = conn
                .query_row(
                    "SELECT 1 FROM model_links
                     WHERE (model_1_id = ?1 AND model_2_id = ?2)
                        OR (model_1_id = ?2 AND model_2_id = ?1)",
                    params![model_1_id.to_string(), model_2_id.to_string()],
                    |_| Ok(()),
                )
                .optional()
                .map_err(|e| storage_error("check_model_link", e))?
                .is_some();
            if linked {
                return Err(Error::DuplicateLink {
                    model_1_id,
                    model_2_id,
                });
            }

            let link = ModelLink::new(model_1_id, model_2_id, cardinality);
            let (m1_unlimited, m1_bound) = cardinality_columns(cardinality.model1_to_model2);
            let (m2_unlimited, m2_bound) = cardinality_columns(cardinality.model2_to_model1);
            conn.execute(
                &format!(
                    "INSERT INTO model_links ({LINK_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    link.id.to_string(),
                    link.model_1_id.to_string(),
                    link.model_2_id.to_string(),
                    m1_unlimited,
                    m1_bound,
                    m2_unlimited,
                    m2_bound,
                    format_timestamp(&link.created_at),
                    format_timestamp(&link.updated_at),
                ],
            )
            .map_err(|e| storage_error("insert_model_link", e))?;

            let table = record_links_table(link.id);
            conn.execute_batch(&format!(
                "CREATE TABLE {table} (
                    id TEXT PRIMARY KEY,
                    record_1_id TEXT NOT NULL,
                    record_2_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE(record_1_id, record_2_id)
                );
                CREATE INDEX idx_{table}_record_1 ON {table}(record_1_id);
                CREATE INDEX idx_{table}_record_2 ON {table}(record_2_id);"
            ))
            .map_err(|e| storage_error("create_record_links_table", e))?;

            Ok(link)
        })
    }

    fn get_model_link(&self, link_id: ModelLinkId) -> Result<ModelLink> {
        let conn = acquire_lock(self.connection());
        load_model_link(&conn, link_id)
    }

    fn list_model_links(&self) -> Result<Vec<ModelLinkView>> {
        let conn = acquire_lock(self.connection());
        let mut stmt = conn
            .prepare(
                "SELECT l.id, l.model_1_id, l.model_2_id, l.model1_unlimited, l.model1_bound,
                        l.model2_unlimited, l.model2_bound, l.created_at, l.updated_at,
                        m1.name, m2.name
                 FROM model_links l
                 JOIN models m1 ON m1.id = l.model_1_id
                 JOIN models m2 ON m2.id = l.model_2_id
                 ORDER BY l.rowid",
            )
            .map_err(|e| storage_error("list_model_links", e))?;
        let views = stmt
            .query_map([], |row| {
                Ok(ModelLinkView {
                    link: model_link_from_row(row)?,
                    model_1_name: row.get(9)?,
                    model_2_name: row.get(10)?,
                })
            })
            .map_err(|e| storage_error("list_model_links", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| storage_error("list_model_links", e))?;
        Ok(views)
    }

    fn update_model_link(
        &self,
        link_id: ModelLinkId,
        cardinality: CardinalitySpec,
    ) -> Result<ModelLink> {
        let conn = acquire_lock(self.connection());
        in_transaction(&conn, |conn| {
            let mut link = load_model_link(conn, link_id)?;
            let table = record_links_table(link_id);

            // A bound can only shrink to what existing links already fit.
            if let Cardinality::AtMost(bound) = cardinality.model1_to_model2 {
                let held = max_edges_per_record(conn, &table, "record_1_id")?;
                if held > bound {
                    return Err(Error::CardinalityViolation { bound, count: held });
                }
            }
            if let Cardinality::AtMost(bound) = cardinality.model2_to_model1 {
                let held = max_edges_per_record(conn, &table, "record_2_id")?;
                if held > bound {
                    return Err(Error::CardinalityViolation { bound, count: held });
                }
            }

            link.cardinality = cardinality;
            link.updated_at = Utc::now();
            let (m1_unlimited, m1_bound) = cardinality_columns(cardinality.model1_to_model2);
            let (m2_unlimited, m2_bound) = cardinality_columns(cardinality.model2_to_model1);
            conn.execute(
                "UPDATE model_links
                 SET model1_unlimited = ?1, model1_bound = ?2,
                     model2_unlimited = ?3, model2_bound = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    m1_unlimited,
                    m1_bound,
                    m2_unlimited,
                    m2_bound,
                    format_timestamp(&link.updated_at),
                    link_id.to_string(),
                ],
            )
            .map_err(|e| storage_error("update_model_link", e))?;

            Ok(link)
        })
    }

    #[instrument(skip(self), fields(operation = "create_record_link", backend = "sqlite", link.id = %link_id))]
    fn create_record_link(
        &self,
        link_id: ModelLinkId,
        record_a: RecordId,
        record_b: RecordId,
    ) -> Result<RecordLink> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(self.connection());
            in_transaction(&conn, |conn| {
                let link = load_model_link(conn, link_id)?;
                let table_1 = records_table(link.model_1_id);
                let table_2 = records_table(link.model_2_id);

                // Orient the pair to the link's sides.
                let a_in_1 = record_exists(conn, &table_1, record_a)?;
                let a_in_2 = record_exists(conn, &table_2, record_a)?;
                let b_in_1 = record_exists(conn, &table_1, record_b)?;
                let b_in_2 = record_exists(conn, &table_2, record_b)?;
                let (record_1, record_2) = if a_in_1 && b_in_2 {
                    (record_a, record_b)
                } else if b_in_1 && a_in_2 {
                    (record_b, record_a)
                } else if !a_in_1 && !a_in_2 {
                    return Err(Error::RecordNotFound(record_a));
                } else {
                    return Err(Error::RecordNotFound(record_b));
                };

                let table = record_links_table(link_id);
                let duplicate = conn
                    .query_row(
                        &format!(
                            "SELECT 1 FROM {table} WHERE record_1_id = ?1 AND record_2_id = ?2"
                        ),
                        params![record_1.to_string(), record_2.to_string()],
                        |_| Ok(()),
                    )
                    .optional()
                    .map_err(|e| storage_error("check_record_link", e))?
                    .is_some();
                if duplicate {
                    return Err(Error::DuplicateRecordLink {
                        record_1_id: record_1,
                        record_2_id: record_2,
                    });
                }

                if let Cardinality::AtMost(bound) = link.cardinality.model1_to_model2 {
                    let count = count_edges(conn, &table, "record_1_id", record_1)?;
                    if count >= bound {
                        return Err(Error::CardinalityExceeded {
                            record_id: record_1,
                            count,
                            bound,
                        });
                    }
                }
                if let Cardinality::AtMost(bound) = link.cardinality.model2_to_model1 {
                    let count = count_edges(conn, &table, "record_2_id", record_2)?;
                    if count >= bound {
                        return Err(Error::CardinalityExceeded {
                            record_id: record_2,
                            count,
                            bound,
                        });
                    }
                }

                let record_link = RecordLink::new(link_id, record_1, record_2);
                conn.execute(
                    &format!(
                        "INSERT INTO {table} (id, record_1_id, record_2_id, created_at)
                         VALUES (?1, ?2, ?3, ?4)"
                    ),
                    params![
                        record_link.id.to_string(),
                        record_link.record_1_id.to_string(),
                        record_link.record_2_id.to_string(),
                        format_timestamp(&record_link.created_at),
                    ],
                )
                .map_err(|e| storage_error("insert_record_link", e))?;

                Ok(record_link)
            })
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "create_record_link", start, status);
        result
    }

    #[instrument(skip(self), fields(operation = "delete_record_link", backend = "sqlite", link.id = %link_id))]
    fn delete_record_link(
        &self,
        link_id: ModelLinkId,
        record_link_id: RecordLinkId,
    ) -> Result<()> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(self.connection());
            load_model_link(&conn, link_id)?;

            let removed = conn
                .execute(
                    &format!(
                        "DELETE FROM {} WHERE id = ?1",
                        record_links_table(link_id)
                    ),
                    params![record_link_id.to_string()],
                )
                .map_err(|e| storage_error("delete_record_link", e))?;
            if removed == 0 {
                return Err(Error::RecordLinkNotFound(record_link_id));
            }
            Ok(())
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "delete_record_link", start, status);
        result
    }

    fn record_links(&self, link_id: ModelLinkId) -> Result<Vec<RecordLink>> {
        let conn = acquire_lock(self.connection());
        load_model_link(&conn, link_id)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, record_1_id, record_2_id, created_at FROM {} ORDER BY rowid",
                record_links_table(link_id)
            ))
            .map_err(|e| storage_error("list_record_links", e))?;
        let links = stmt
            .query_map([], |row| record_link_from_row(link_id, row))
            .map_err(|e| storage_error("list_record_links", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| storage_error("list_record_links", e))?;
        Ok(links)
    }

    fn record_links_for(
        &self,
        link_id: ModelLinkId,
        record_id: RecordId,
    ) -> Result<Vec<RecordLink>> {
        let conn = acquire_lock(self.connection());
        load_model_link(&conn, link_id)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, record_1_id, record_2_id, created_at FROM {}
                 WHERE record_1_id = ?1 OR record_2_id = ?1 ORDER BY rowid",
                record_links_table(link_id)
            ))
            .map_err(|e| storage_error("list_record_links", e))?;
        let links = stmt
            .query_map(params![record_id.to_string()], |row| {
                record_link_from_row(link_id, row)
            })
            .map_err(|e| storage_error("list_record_links", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| storage_error("list_record_links", e))?;
        Ok(links)
    }
}
