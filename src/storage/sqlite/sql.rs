//! SQL helper functions for the `SQLite` store.
//!
//! This module provides utilities for SQL query construction, including:
//! - Engine-generated table and column identifiers
//! - Mapping between field values and `SQLite` storage classes
//! - LIKE wildcard escaping
//! - Filter and order clause building with numbered parameters
//!
//! Table and column names are always derived from engine-generated UUIDs;
//! user input only ever reaches queries as bound parameters.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use uuid::Uuid;

use crate::models::{
    Field, FieldId, FieldType, FieldValue, FilterCondition, FilterPredicate, ModelId, ModelLinkId,
    SortKey, SortOrder, SortSpec,
};
use crate::{Error, Result};

/// Returns the record table name for a model.
#[must_use]
pub(crate) fn records_table(model_id: ModelId) -> String {
    format!("records_{}", model_id.into_inner().simple())
}

/// Returns the edge table name for a model link.
#[must_use]
pub(crate) fn record_links_table(link_id: ModelLinkId) -> String {
    format!("record_links_{}", link_id.into_inner().simple())
}

/// Returns the column name for a field.
#[must_use]
pub(crate) fn field_column(field_id: FieldId) -> String {
    format!("f_{}", field_id.into_inner().simple())
}

/// Returns the `SQLite` column type for a field type.
#[must_use]
pub(crate) const fn column_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::SingleLineText
        | FieldType::MultiLineText
        | FieldType::Email
        | FieldType::Date
        | FieldType::DateTime => "TEXT",
        FieldType::Number => "REAL",
        FieldType::Boolean => "INTEGER",
    }
}

/// Formats a timestamp in the store's canonical form: RFC 3339 in UTC with
/// fixed six-digit fractional seconds, so that text ordering matches time
/// ordering.
#[must_use]
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp stored by [`format_timestamp`].
pub(crate) fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Parses a UUID column.
pub(crate) fn parse_uuid(idx: usize, text: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Converts a field value into the `SQLite` value it is stored as.
#[must_use]
pub(crate) fn sql_value(value: &FieldValue) -> SqlValue {
    match value {
        FieldValue::Text(s) => SqlValue::Text(s.clone()),
        FieldValue::Number(n) => SqlValue::Real(*n),
        FieldValue::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        FieldValue::Date(d) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
        FieldValue::DateTime(dt) => SqlValue::Text(format_timestamp(dt)),
    }
}

/// Converts a stored `SQLite` value back into a field value.
///
/// `NULL` maps to `None`. A storage class that does not match the field's
/// type is a corruption and surfaces as a conversion failure.
pub(crate) fn field_value_from_sql(
    field: &Field,
    idx: usize,
    value: SqlValue,
) -> rusqlite::Result<Option<FieldValue>> {
    let mismatch = |found: &str| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!(
                "field '{}' of type {} holds a {found} value",
                field.name, field.field_type
            )
            .into(),
        )
    };

    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Text(text) => match field.field_type {
            FieldType::SingleLineText | FieldType::MultiLineText | FieldType::Email => {
                Ok(Some(FieldValue::Text(text)))
            }
            FieldType::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map(|d| Some(FieldValue::Date(d)))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        idx,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                }),
            FieldType::DateTime => parse_timestamp(idx, &text)
                .map(|dt| Some(FieldValue::DateTime(dt))),
            FieldType::Number | FieldType::Boolean => Err(mismatch("text")),
        },
        SqlValue::Real(n) => match field.field_type {
            FieldType::Number => Ok(Some(FieldValue::Number(n))),
            _ => Err(mismatch("real")),
        },
        SqlValue::Integer(i) => match field.field_type {
            FieldType::Boolean => Ok(Some(FieldValue::Boolean(i != 0))),
            #[allow(clippy::cast_precision_loss)]
            FieldType::Number => Ok(Some(FieldValue::Number(i as f64))),
            _ => Err(mismatch("integer")),
        },
        SqlValue::Blob(_) => Err(mismatch("blob")),
    }
}

/// Escapes SQL LIKE wildcards in a string to make them literal.
///
/// SQL LIKE uses `%` (match any characters) and `_` (match single character)
/// as wildcards. When searching for literal `%` or `_` characters, they must
/// be escaped with a backslash. The backslash itself also needs escaping.
#[must_use]
pub fn escape_like_wildcards(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

/// Finds a field by name, case-sensitively.
pub(crate) fn find_field<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}

/// Builds a WHERE clause from search filters with numbered parameters.
///
/// Returns the clause (prefixed with `" WHERE "` when any filter is
/// present), the bound parameter values, and the next free parameter index.
/// Every filter is resolved against the model's fields; a filter that does
/// not resolve or does not fit its field's type fails the whole query.
pub(crate) fn build_filter_clause(
    fields: &[Field],
    filters: &[FilterPredicate],
    start_param: usize,
) -> Result<(String, Vec<SqlValue>, usize)> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();
    let mut param_idx = start_param;

    for predicate in filters {
        let field = find_field(fields, &predicate.field).ok_or_else(|| Error::UnknownField {
            field: predicate.field.clone(),
        })?;
        if !predicate.condition.applies_to(field.field_type) {
            return Err(Error::InvalidFilter {
                field: predicate.field.clone(),
                reason: format!("condition does not apply to a {} field", field.field_type),
            });
        }

        let column = field_column(field.id);
        match &predicate.condition {
            FilterCondition::TextContains(text) => {
                conditions.push(format!("{column} LIKE ?{param_idx} ESCAPE '\\'"));
                param_idx += 1;
                params.push(SqlValue::Text(format!(
                    "%{}%",
                    escape_like_wildcards(text)
                )));
            }
            FilterCondition::TextEquals(text) => {
                conditions.push(format!("{column} = ?{param_idx}"));
                param_idx += 1;
                params.push(SqlValue::Text(text.clone()));
            }
            FilterCondition::TextStartsWith(text) => {
                conditions.push(format!("{column} LIKE ?{param_idx} ESCAPE '\\'"));
                param_idx += 1;
                params.push(SqlValue::Text(format!("{}%", escape_like_wildcards(text))));
            }
            FilterCondition::TextEndsWith(text) => {
                conditions.push(format!("{column} LIKE ?{param_idx} ESCAPE '\\'"));
                param_idx += 1;
                params.push(SqlValue::Text(format!("%{}", escape_like_wildcards(text))));
            }
            FilterCondition::TextNotContains(text) => {
                // Null values count as "does not contain".
                conditions.push(format!(
                    "({column} IS NULL OR {column} NOT LIKE ?{param_idx} ESCAPE '\\')"
                ));
                param_idx += 1;
                params.push(SqlValue::Text(format!(
                    "%{}%",
                    escape_like_wildcards(text)
                )));
            }
            FilterCondition::TextNotEquals(text) => {
                conditions.push(format!(
                    "({column} IS NULL OR {column} != ?{param_idx})"
                ));
                param_idx += 1;
                params.push(SqlValue::Text(text.clone()));
            }
            FilterCondition::NumberEquals(n) => {
                conditions.push(format!("{column} = ?{param_idx}"));
                param_idx += 1;
                params.push(SqlValue::Real(*n));
            }
            FilterCondition::NumberGreaterThan(n) => {
                conditions.push(format!("{column} > ?{param_idx}"));
                param_idx += 1;
                params.push(SqlValue::Real(*n));
            }
            FilterCondition::NumberLessThan(n) => {
                conditions.push(format!("{column} < ?{param_idx}"));
                param_idx += 1;
                params.push(SqlValue::Real(*n));
            }
            FilterCondition::BooleanEquals(b) => {
                conditions.push(format!("{column} = ?{param_idx}"));
                param_idx += 1;
                params.push(SqlValue::Integer(i64::from(*b)));
            }
            FilterCondition::DateOn(value) => {
                conditions.push(format!("{column} = ?{param_idx}"));
                param_idx += 1;
                params.push(temporal_param(field, value)?);
            }
            FilterCondition::DateBefore(value) => {
                conditions.push(format!("{column} < ?{param_idx}"));
                param_idx += 1;
                params.push(temporal_param(field, value)?);
            }
            FilterCondition::DateAfter(value) => {
                conditions.push(format!("{column} > ?{param_idx}"));
                param_idx += 1;
                params.push(temporal_param(field, value)?);
            }
            FilterCondition::DateBetween { from, to } => {
                conditions.push(format!(
                    "{column} >= ?{param_idx} AND {column} <= ?{}",
                    param_idx + 1
                ));
                param_idx += 2;
                params.push(temporal_param(field, from)?);
                params.push(temporal_param(field, to)?);
            }
        }
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    Ok((clause, params, param_idx))
}

/// Builds an ORDER BY clause for a sort specification.
///
/// Sorting on a field falls back to the record id as a tiebreak so paging
/// stays stable across equal values.
pub(crate) fn build_order_clause(fields: &[Field], sort: &SortSpec) -> Result<String> {
    let direction = match sort.order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    };
    let expression = match &sort.key {
        SortKey::CreatedAt => "created_at".to_string(),
        SortKey::UpdatedAt => "updated_at".to_string(),
        SortKey::Id => return Ok(format!(" ORDER BY id {direction}")),
        SortKey::Field(name) => {
            let field = find_field(fields, name).ok_or_else(|| Error::UnknownField {
                field: name.clone(),
            })?;
            field_column(field.id)
        }
    };
    Ok(format!(" ORDER BY {expression} {direction}, id ASC"))
}

/// Converts a date-family filter payload against the field's declared type.
fn temporal_param(field: &Field, value: &serde_json::Value) -> Result<SqlValue> {
    let converted =
        FieldValue::from_json(field.field_type, value).map_err(|reason| Error::InvalidFilter {
            field: field.name.clone(),
            reason,
        })?;
    Ok(sql_value(&converted))
}
