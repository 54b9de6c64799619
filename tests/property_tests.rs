//! Property-based tests for field values and engine invariants.
//!
//! Uses proptest to verify invariants across random inputs:
//! - JSON conversions round trip for every field type
//! - Single-line and email validation match their definitions
//! - Field type and permission names round trip through parse
//! - Cardinality bounds are never overshot on a live store
//! - Page limits are validated over the whole range

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{FixedOffset, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tabula::models::{is_valid_email, validate_text};
use tabula::{
    Cardinality, CardinalitySpec, Error, FieldSpec, FieldType, FieldValue, LinkBackend,
    Permission, RecordBackend, RecordQuery, SchemaBackend, SqliteStore, UserId,
};

// ============================================================================
// Value Conversion Properties
// ============================================================================

proptest! {
    /// Property: single-line text without line breaks converts and is
    /// preserved exactly.
    #[test]
    fn prop_single_line_text_round_trips(s in "[a-zA-Z0-9 .,;:!?'-]{0,80}") {
        let value = FieldValue::from_json(FieldType::SingleLineText, &json!(s));
        prop_assert_eq!(value, Ok(FieldValue::Text(s)));
    }

    /// Property: any line break anywhere makes a single-line value invalid.
    #[test]
    fn prop_single_line_rejects_line_breaks(
        prefix in "[a-z ]{0,20}",
        suffix in "[a-z ]{0,20}",
        brk in prop::sample::select(vec!["\n", "\r", "\r\n"])
    ) {
        let text = format!("{prefix}{brk}{suffix}");
        prop_assert!(validate_text(FieldType::SingleLineText, &text).is_err());
        prop_assert!(FieldValue::from_json(FieldType::SingleLineText, &json!(text)).is_err());
    }

    /// Property: multi-line text accepts line breaks unchanged.
    #[test]
    fn prop_multi_line_accepts_breaks(s in "[a-zA-Z \\n\\r]{0,60}") {
        let value = FieldValue::from_json(FieldType::MultiLineText, &json!(s));
        prop_assert_eq!(value, Ok(FieldValue::Text(s)));
    }

    /// Property: single-line validation succeeds iff the text has no CR or LF.
    #[test]
    fn prop_single_line_validation_matches_definition(s in "[a-z \\n\\r]{0,40}") {
        let clean = !s.contains('\n') && !s.contains('\r');
        prop_assert_eq!(validate_text(FieldType::SingleLineText, &s).is_ok(), clean);
    }

    /// Property: finite numbers round trip exactly.
    #[test]
    fn prop_finite_numbers_round_trip(n in -1.0e12f64..1.0e12) {
        let value = FieldValue::from_json(FieldType::Number, &json!(n));
        prop_assert_eq!(value, Ok(FieldValue::Number(n)));
    }

    /// Property: number conversion succeeds iff the input is finite.
    ///
    /// JSON has no representation for NaN or infinity, so non-finite inputs
    /// arrive as null and are rejected.
    #[test]
    fn prop_number_conversion_iff_finite(n in prop::num::f64::ANY) {
        let result = FieldValue::from_json(FieldType::Number, &json!(n));
        prop_assert_eq!(result.is_ok(), n.is_finite());
    }

    /// Property: booleans round trip.
    #[test]
    fn prop_booleans_round_trip(b in any::<bool>()) {
        let value = FieldValue::from_json(FieldType::Boolean, &json!(b));
        prop_assert_eq!(value, Ok(FieldValue::Boolean(b)));
    }

    /// Property: ISO dates round trip through conversion and display.
    #[test]
    fn prop_dates_round_trip(y in 1900i32..2100, m in 1u32..=12, d in 1u32..=28) {
        let text = format!("{y:04}-{m:02}-{d:02}");
        let value = FieldValue::from_json(FieldType::Date, &json!(text)).unwrap();
        prop_assert_eq!(value.to_string(), text);
    }

    /// Property: datetimes with any offset normalize to the same UTC instant.
    #[test]
    fn prop_datetimes_normalize_to_utc(
        secs in 0i64..4_000_000_000,
        offset_mins in -720i32..=720
    ) {
        let instant = Utc.timestamp_opt(secs, 0).unwrap();
        let offset = FixedOffset::east_opt(offset_mins * 60).unwrap();
        let text = instant.with_timezone(&offset).to_rfc3339();

        let value = FieldValue::from_json(FieldType::DateTime, &json!(text));
        prop_assert_eq!(value, Ok(FieldValue::DateTime(instant)));
    }

    /// Property: simple `local@domain.tld` addresses are accepted.
    #[test]
    fn prop_email_shape_accepted(
        local in "[a-z][a-z0-9._]{0,9}",
        domain in "[a-z]{1,10}",
        tld in prop::sample::select(vec!["com", "org", "io"])
    ) {
        let address = format!("{local}@{domain}.{tld}");
        prop_assert!(is_valid_email(&address));
        prop_assert!(FieldValue::from_json(FieldType::Email, &json!(address)).is_ok());
    }

    /// Property: a string without an @ is never a valid email.
    #[test]
    fn prop_email_requires_at_sign(s in "[a-z0-9.]{0,30}") {
        prop_assert!(!is_valid_email(&s));
    }
}

// ============================================================================
// Name Round-Trip Properties
// ============================================================================

proptest! {
    /// Property: `FieldType::as_str` round trips through parse.
    #[test]
    fn prop_field_type_round_trips(field_type in prop::sample::select(FieldType::ALL.to_vec())) {
        prop_assert_eq!(FieldType::parse(field_type.as_str()), Some(field_type));
        prop_assert_eq!(field_type.as_str().parse::<FieldType>().ok(), Some(field_type));
    }

    /// Property: `Permission::as_str` round trips through parse.
    #[test]
    fn prop_permission_round_trips(permission in prop::sample::select(Permission::ALL.to_vec())) {
        prop_assert_eq!(Permission::parse(permission.as_str()), Some(permission));
    }

    /// Property: every field type converts losslessly to itself.
    #[test]
    fn prop_conversion_is_reflexive(field_type in prop::sample::select(FieldType::ALL.to_vec())) {
        prop_assert!(field_type.is_convertible_to(field_type));
    }

    /// Property: `AtMost` admits exactly the counts below its bound.
    #[test]
    fn prop_at_most_admits_below_bound(bound in 0u64..100, current in 0u64..200) {
        prop_assert_eq!(Cardinality::AtMost(bound).admits(current), current < bound);
        prop_assert!(Cardinality::Unlimited.admits(current));
    }
}

// ============================================================================
// Store-Backed Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: a directional bound is never overshot, whatever the order
    /// of attempts.
    #[test]
    fn prop_cardinality_bound_never_overshoots(bound in 0u64..4, attempts in 1u64..8) {
        let store = SqliteStore::in_memory().unwrap();
        let invoice = store.create_model("Invoice", "", UserId::new()).unwrap();
        let customer = store.create_model("Customer", "", UserId::new()).unwrap();
        let link = store
            .create_model_link(
                invoice.id,
                customer.id,
                CardinalitySpec::new(Cardinality::AtMost(bound), Cardinality::Unlimited),
            )
            .unwrap();

        let inv = store
            .create_record(invoice.id, &JsonMap::<String, JsonValue>::new())
            .unwrap();

        let mut successes = 0u64;
        for _ in 0..attempts {
            let cust = store
                .create_record(customer.id, &JsonMap::<String, JsonValue>::new())
                .unwrap();
            match store.create_record_link(link.id, inv, cust) {
                Ok(_) => successes += 1,
                Err(Error::CardinalityExceeded { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        prop_assert_eq!(successes, bound.min(attempts));
        prop_assert_eq!(
            store.record_links_for(link.id, inv).unwrap().len() as u64,
            successes
        );
    }

    /// Property: page limits inside `1..=100` are accepted, everything else
    /// is rejected.
    #[test]
    fn prop_page_limit_validation(limit in 0u32..300) {
        let store = SqliteStore::in_memory().unwrap();
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();

        let query = RecordQuery::new().with_page(0, limit);
        let result = store.search_records(model.id, &query);

        if (1..=100).contains(&limit) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(
                matches!(result, Err(Error::InvalidPageSize { .. })),
                "expected InvalidPageSize, got {:?}",
                result
            );
        }
    }

    /// Property: stored text values come back byte-identical.
    #[test]
    fn prop_stored_text_survives_round_trip(s in "[a-zA-Z0-9 .,!?-]{0,60}") {
        let store = SqliteStore::in_memory().unwrap();
        let model = store.create_model("Note", "", UserId::new()).unwrap();
        store
            .add_field(model.id, &FieldSpec::new("body", FieldType::SingleLineText))
            .unwrap();

        let payload = json!({ "body": s });
        let record_id = store
            .create_record(model.id, payload.as_object().unwrap())
            .unwrap();
        let record = store.get_record(model.id, record_id).unwrap();

        prop_assert_eq!(record.values.get("body"), Some(&FieldValue::Text(s)));
    }
}

#[cfg(test)]
mod manual_property_tests {
    use super::*;

    /// A zero bound blocks the very first link.
    #[test]
    fn test_zero_bound_blocks_first_link() {
        let store = SqliteStore::in_memory().unwrap();
        let invoice = store.create_model("Invoice", "", UserId::new()).unwrap();
        let customer = store.create_model("Customer", "", UserId::new()).unwrap();
        let link = store
            .create_model_link(
                invoice.id,
                customer.id,
                CardinalitySpec::new(Cardinality::AtMost(0), Cardinality::Unlimited),
            )
            .unwrap();

        let inv = store
            .create_record(invoice.id, &JsonMap::<String, JsonValue>::new())
            .unwrap();
        let cust = store
            .create_record(customer.id, &JsonMap::<String, JsonValue>::new())
            .unwrap();

        let err = store.create_record_link(link.id, inv, cust).unwrap_err();
        assert!(matches!(
            err,
            Error::CardinalityExceeded { count: 0, bound: 0, .. }
        ));
    }

    /// Unlimited bounds admit arbitrarily many links.
    #[test]
    fn test_unlimited_never_blocks() {
        assert!(Cardinality::Unlimited.admits(0));
        assert!(Cardinality::Unlimited.admits(u64::MAX));
    }
}
