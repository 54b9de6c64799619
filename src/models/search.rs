//! Record search types.
//!
//! A [`RecordQuery`] combines field filters, a sort specification, and a
//! page request. All filters must match for a record to be returned.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::field::FieldType;
use super::record::Record;

/// Largest allowed page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when none is requested.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// A single filter applied to one field's values.
///
/// Date payloads are JSON strings interpreted against the field's declared
/// type: `YYYY-MM-DD` for date fields, RFC 3339 for datetime fields.
/// Records without a value never match a positive condition; they do match
/// the negated text conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCondition {
    /// Text value contains the substring.
    TextContains(String),
    /// Text value equals the string exactly.
    TextEquals(String),
    /// Text value starts with the prefix.
    TextStartsWith(String),
    /// Text value ends with the suffix.
    TextEndsWith(String),
    /// Text value is absent or does not contain the substring.
    TextNotContains(String),
    /// Text value is absent or differs from the string.
    TextNotEquals(String),
    /// Number value equals.
    NumberEquals(f64),
    /// Number value is strictly greater.
    NumberGreaterThan(f64),
    /// Number value is strictly smaller.
    NumberLessThan(f64),
    /// Boolean value equals.
    BooleanEquals(bool),
    /// Date or datetime value falls on the given day or instant.
    DateOn(JsonValue),
    /// Date or datetime value is strictly earlier.
    DateBefore(JsonValue),
    /// Date or datetime value is strictly later.
    DateAfter(JsonValue),
    /// Date or datetime value lies in the inclusive range.
    DateBetween {
        /// Inclusive lower bound.
        from: JsonValue,
        /// Inclusive upper bound.
        to: JsonValue,
    },
}

impl FilterCondition {
    /// Returns true when the condition can be evaluated against a field of
    /// the given type.
    #[must_use]
    pub const fn applies_to(&self, field_type: FieldType) -> bool {
        match self {
            Self::TextContains(_)
            | Self::TextEquals(_)
            | Self::TextStartsWith(_)
            | Self::TextEndsWith(_)
            | Self::TextNotContains(_)
            | Self::TextNotEquals(_) => field_type.is_text(),
            Self::NumberEquals(_) | Self::NumberGreaterThan(_) | Self::NumberLessThan(_) => {
                matches!(field_type, FieldType::Number)
            }
            Self::BooleanEquals(_) => matches!(field_type, FieldType::Boolean),
            Self::DateOn(_)
            | Self::DateBefore(_)
            | Self::DateAfter(_)
            | Self::DateBetween { .. } => field_type.is_temporal(),
        }
    }
}

/// A filter bound to a field by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    /// Field the condition applies to.
    pub field: String,
    /// The condition.
    pub condition: FilterCondition,
}

impl FilterPredicate {
    /// Creates a predicate on the named field.
    pub fn new(field: impl Into<String>, condition: FilterCondition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }
}

/// What to order results by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Creation time.
    CreatedAt,
    /// Last modification time.
    UpdatedAt,
    /// Record identifier.
    Id,
    /// A field's value, by name.
    Field(String),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// Returns the direction as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// A sort key with a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// What to sort by.
    pub key: SortKey,
    /// Which way.
    pub order: SortOrder,
}

impl SortSpec {
    /// Creates a sort specification.
    #[must_use]
    pub const fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }
}

impl Default for SortSpec {
    /// Newest records first.
    fn default() -> Self {
        Self::new(SortKey::CreatedAt, SortOrder::Descending)
    }
}

/// Which slice of the result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Records to skip.
    pub offset: u64,
    /// Records to return, `1..=MAX_PAGE_SIZE`.
    pub limit: u32,
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(offset: u64, limit: u32) -> Self {
        Self { offset, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// A full search request against one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Filters, all of which must match.
    #[serde(default)]
    pub filters: Vec<FilterPredicate>,
    /// Result ordering.
    #[serde(default)]
    pub sort: SortSpec,
    /// Result slice.
    #[serde(default)]
    pub page: PageRequest,
}

impl RecordQuery {
    /// Creates a query with no filters and default sort and paging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter on the named field.
    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, condition: FilterCondition) -> Self {
        self.filters.push(FilterPredicate::new(field, condition));
        self
    }

    /// Sets the sort specification.
    #[must_use]
    pub fn with_sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort = SortSpec::new(key, order);
        self
    }

    /// Sets the page request.
    #[must_use]
    pub const fn with_page(mut self, offset: u64, limit: u32) -> Self {
        self.page = PageRequest::new(offset, limit);
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPage {
    /// Records on this page, in requested order.
    pub records: Vec<Record>,
    /// Total records matching the filters, across all pages.
    pub total: u64,
    /// Offset this page starts at.
    pub offset: u64,
    /// Limit the page was requested with.
    pub limit: u32,
}

impl RecordPage {
    /// Returns true when more records exist past this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset + (self.records.len() as u64) < self.total
    }
}
