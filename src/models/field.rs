//! Field definitions.
//!
//! Fields describe the typed attributes of a model. The set of fields on a
//! model can change at any time; storage alters the model's record table to
//! match.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{FieldId, ModelId};

/// The value type a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Text without line breaks.
    SingleLineText,
    /// Text that may span multiple lines.
    MultiLineText,
    /// A finite double-precision number.
    Number,
    /// True or false.
    Boolean,
    /// A calendar date without a time component.
    Date,
    /// An instant in time, stored in UTC.
    DateTime,
    /// A single-line text value constrained to an email address shape.
    Email,
}

impl FieldType {
    /// All supported field types, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::SingleLineText,
        Self::MultiLineText,
        Self::Number,
        Self::Boolean,
        Self::Date,
        Self::DateTime,
        Self::Email,
    ];

    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleLineText => "single_line_text",
            Self::MultiLineText => "multi_line_text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Email => "email",
        }
    }

    /// Parses a field type from its string form (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single_line_text" => Some(Self::SingleLineText),
            "multi_line_text" => Some(Self::MultiLineText),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::DateTime),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    /// Returns true for the text-backed types.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            Self::SingleLineText | Self::MultiLineText | Self::Email
        )
    }

    /// Returns true for the date-backed types.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    /// Returns true when stored values of this type can be reinterpreted as
    /// `target` without loss.
    ///
    /// Text types convert among each other, subject to per-value checks when
    /// the target is stricter (no line breaks for single-line, address shape
    /// for email). `Date` widens to `DateTime` at midnight UTC. Everything
    /// else only converts to itself.
    #[must_use]
    pub const fn is_convertible_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::SingleLineText,
                Self::SingleLineText | Self::MultiLineText | Self::Email
            ) | (
                Self::MultiLineText,
                Self::MultiLineText | Self::SingleLineText | Self::Email
            ) | (
                Self::Email,
                Self::Email | Self::SingleLineText | Self::MultiLineText
            ) | (Self::Date, Self::Date | Self::DateTime)
                | (Self::Number, Self::Number)
                | (Self::Boolean, Self::Boolean)
                | (Self::DateTime, Self::DateTime)
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown field type: {s}"))
    }
}

/// A typed attribute of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Unique identifier.
    pub id: FieldId,
    /// Model this field belongs to.
    pub model_id: ModelId,
    /// Name, unique among the model's fields (case-sensitive).
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Value type.
    pub field_type: FieldType,
    /// Marks the field whose value labels records in link displays.
    pub is_parent: bool,
    /// Whether every record must carry a value for this field.
    pub is_required: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Field {
    /// Creates a field from a spec with a fresh identifier and timestamps.
    #[must_use]
    pub fn new(model_id: ModelId, spec: &FieldSpec) -> Self {
        let now = Utc::now();
        Self {
            id: FieldId::new(),
            model_id,
            name: spec.name.clone(),
            description: spec.description.clone(),
            field_type: spec.field_type,
            is_parent: spec.is_parent,
            is_required: spec.is_required,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Describes a field to add to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Value type.
    pub field_type: FieldType,
    /// Marks the field as the record label.
    pub is_parent: bool,
    /// Whether a value is mandatory on every record.
    pub is_required: bool,
}

impl FieldSpec {
    /// Creates a spec for an optional field with no description.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            field_type,
            is_parent: false,
            is_required: false,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Marks the field as the record label.
    #[must_use]
    pub const fn parent(mut self) -> Self {
        self.is_parent = true;
        self
    }
}

/// Partial update of a field. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// New name, if renaming.
    pub name: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// New value type, if converting. Only lossless conversions are allowed.
    pub field_type: Option<FieldType>,
    /// New record-label flag, if changing.
    pub is_parent: Option<bool>,
    /// New required flag, if changing.
    pub is_required: Option<bool>,
}

impl FieldUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name to apply.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description to apply.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the target value type.
    #[must_use]
    pub const fn with_field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Sets the record-label flag.
    #[must_use]
    pub const fn with_is_parent(mut self, is_parent: bool) -> Self {
        self.is_parent = Some(is_parent);
        self
    }

    /// Sets the required flag.
    #[must_use]
    pub const fn with_is_required(mut self, is_required: bool) -> Self {
        self.is_required = Some(is_required);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(FieldType::SingleLineText, "single_line_text")]
    #[test_case(FieldType::MultiLineText, "multi_line_text")]
    #[test_case(FieldType::Number, "number")]
    #[test_case(FieldType::Boolean, "boolean")]
    #[test_case(FieldType::Date, "date")]
    #[test_case(FieldType::DateTime, "datetime")]
    #[test_case(FieldType::Email, "email")]
    fn test_field_type_round_trip(field_type: FieldType, s: &str) {
        assert_eq!(field_type.as_str(), s);
        assert_eq!(FieldType::parse(s), Some(field_type));
    }

    #[test]
    fn test_field_type_parse_case_insensitive() {
        assert_eq!(FieldType::parse("NUMBER"), Some(FieldType::Number));
        assert_eq!(FieldType::parse("DateTime"), Some(FieldType::DateTime));
        assert_eq!(FieldType::parse("decimal"), None);
    }

    #[test]
    fn test_text_family() {
        assert!(FieldType::SingleLineText.is_text());
        assert!(FieldType::MultiLineText.is_text());
        assert!(FieldType::Email.is_text());
        assert!(!FieldType::Number.is_text());
        assert!(!FieldType::Date.is_text());
    }

    #[test_case(FieldType::MultiLineText, FieldType::SingleLineText, true)]
    #[test_case(FieldType::SingleLineText, FieldType::Email, true)]
    #[test_case(FieldType::Email, FieldType::MultiLineText, true)]
    #[test_case(FieldType::Date, FieldType::DateTime, true)]
    #[test_case(FieldType::DateTime, FieldType::Date, false)]
    #[test_case(FieldType::Number, FieldType::SingleLineText, false)]
    #[test_case(FieldType::Boolean, FieldType::Number, false)]
    #[test_case(FieldType::Number, FieldType::Number, true)]
    fn test_conversion_matrix(from: FieldType, to: FieldType, allowed: bool) {
        assert_eq!(from.is_convertible_to(to), allowed);
    }

    #[test]
    fn test_spec_builders() {
        let spec = FieldSpec::new("total", FieldType::Number)
            .with_description("Invoice total")
            .required();
        assert_eq!(spec.name, "total");
        assert!(spec.is_required);
        assert!(!spec.is_parent);

        let field = Field::new(ModelId::new(), &spec);
        assert_eq!(field.name, "total");
        assert_eq!(field.field_type, FieldType::Number);
        assert!(field.is_required);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&FieldType::SingleLineText).unwrap();
        assert_eq!(json, "\"single_line_text\"");
    }
}
