//! Typed identifiers for catalog entities.
//!
//! Every entity gets its own UUID-backed newtype so that a record id can
//! never be passed where a model id is expected. Identifiers serialize as
//! plain hyphenated UUID strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[allow(clippy::new_without_default)]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a model definition.
    ModelId
);

uuid_id!(
    /// Identifier of a field within a model.
    FieldId
);

uuid_id!(
    /// Identifier of a record stored in a model's table.
    RecordId
);

uuid_id!(
    /// Identifier of a link definition between two models.
    ModelLinkId
);

uuid_id!(
    /// Identifier of a single record-to-record link.
    RecordLinkId
);

uuid_id!(
    /// Identifier of an account interacting with the engine.
    UserId
);

uuid_id!(
    /// Identifier of a permission grant row.
    PermissionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = ModelId::new();
        let b = ModelId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_round_trips() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!("not-a-uuid".parse::<FieldId>().is_err());
        assert!("".parse::<ModelLinkId>().is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
