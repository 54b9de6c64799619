//! Model links and record links.
//!
//! A model link declares that records of two models may be connected, with
//! an upper bound per direction. A record link is one such connection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ModelId, ModelLinkId, RecordId, RecordLinkId};

/// Upper bound on links per record in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// No bound.
    Unlimited,
    /// At most this many linked records.
    AtMost(u64),
}

impl Cardinality {
    /// Returns true when a record currently holding `current` links may
    /// accept one more.
    #[must_use]
    pub const fn admits(&self, current: u64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::AtMost(bound) => current < *bound,
        }
    }

    /// Returns true for the unbounded case.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

/// Bounds for both directions of a model link.
///
/// `model1_to_model2` bounds how many model-2 records a single model-1
/// record may link to; `model2_to_model1` bounds the reverse direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardinalitySpec {
    /// Bound on model-2 records per model-1 record.
    pub model1_to_model2: Cardinality,
    /// Bound on model-1 records per model-2 record.
    pub model2_to_model1: Cardinality,
}

impl CardinalitySpec {
    /// Creates a spec with explicit bounds per direction.
    #[must_use]
    pub const fn new(model1_to_model2: Cardinality, model2_to_model1: Cardinality) -> Self {
        Self {
            model1_to_model2,
            model2_to_model1,
        }
    }

    /// Creates a spec with no bounds in either direction.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self::new(Cardinality::Unlimited, Cardinality::Unlimited)
    }
}

impl Default for CardinalitySpec {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// A declared connection between two models.
///
/// The pair is unordered for uniqueness purposes: at most one link may exist
/// between any two models, and a model never links to itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLink {
    /// Unique identifier.
    pub id: ModelLinkId,
    /// First endpoint.
    pub model_1_id: ModelId,
    /// Second endpoint.
    pub model_2_id: ModelId,
    /// Per-direction bounds.
    pub cardinality: CardinalitySpec,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl ModelLink {
    /// Creates a link between two models with a fresh identifier.
    #[must_use]
    pub fn new(model_1_id: ModelId, model_2_id: ModelId, cardinality: CardinalitySpec) -> Self {
        let now = Utc::now();
        Self {
            id: ModelLinkId::new(),
            model_1_id,
            model_2_id,
            cardinality,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true when the model is one of the link's endpoints.
    #[must_use]
    pub fn touches(&self, model_id: ModelId) -> bool {
        self.model_1_id == model_id || self.model_2_id == model_id
    }
}

/// A model link joined with the names of its endpoint models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLinkView {
    /// The link itself.
    pub link: ModelLink,
    /// Name of the first endpoint model.
    pub model_1_name: String,
    /// Name of the second endpoint model.
    pub model_2_name: String,
}

/// A connection between two concrete records.
///
/// `record_1_id` always belongs to the link's `model_1_id` and
/// `record_2_id` to `model_2_id`, regardless of the order the records were
/// supplied in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordLink {
    /// Unique identifier.
    pub id: RecordLinkId,
    /// Link definition this connection belongs to.
    pub model_link_id: ModelLinkId,
    /// Record on the model-1 side.
    pub record_1_id: RecordId,
    /// Record on the model-2 side.
    pub record_2_id: RecordId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl RecordLink {
    /// Creates a record link with a fresh identifier.
    #[must_use]
    pub fn new(model_link_id: ModelLinkId, record_1_id: RecordId, record_2_id: RecordId) -> Self {
        Self {
            id: RecordLinkId::new(),
            model_link_id,
            record_1_id,
            record_2_id,
            created_at: Utc::now(),
        }
    }
}
