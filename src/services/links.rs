//! Record linking service.
//!
//! A model link declares that two models' records may be connected and
//! bounds how many connections a single record may hold per direction. A
//! record link is one such connection. Links carry no payload; they are
//! pure edges.
//!
//! # Features
//!
//! - **Link definitions**: one link per unordered model pair, never a
//!   model to itself
//! - **Cardinality**: per-direction bounds, enforced at link time and
//!   re-validated when bounds change
//! - **Orientation-free**: records can be passed in either order; storage
//!   orients them onto the link's sides
//!
//! # Permissions
//!
//! Pair with [`PermissionService`](super::PermissionService) in the API
//! layer:
//!
//! | Operation | Required right |
//! |-----------|----------------|
//! | `link_models`, `update_link` | admin caller (no grant covers them) |
//! | `link_records` | `add_records` on both endpoint models |
//! | `unlink_records` | `delete_records` on both endpoint models |
//! | `model_link`, `model_links`, `record_links`, `record_links_for` | `view_records` |
//!
//! # Example
//!
//! ```rust,ignore
//! use tabula::{Cardinality, CardinalitySpec};
//!
//! // Each invoice belongs to at most one customer.
//! let link = service.link_models(
//!     invoice_id,
//!     customer_id,
//!     CardinalitySpec::new(Cardinality::AtMost(1), Cardinality::Unlimited),
//! )?;
//! service.link_records(link.id, invoice_record, customer_record)?;
//! ```

use std::sync::Arc;

use crate::Result;
use crate::models::{
    CardinalitySpec, ModelId, ModelLink, ModelLinkId, ModelLinkView, RecordId, RecordLink,
    RecordLinkId,
};
use crate::storage::LinkBackend;

/// Service for linking records across models.
///
/// Uses a [`LinkBackend`] for persistence.
pub struct LinkService {
    backend: Arc<dyn LinkBackend>,
}

impl LinkService {
    /// Creates a new link service with the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn LinkBackend>) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Link Definitions
    // =========================================================================

    /// Links two models, creating the empty edge table for their records.
    ///
    /// # Arguments
    ///
    /// * `model_1_id` - First endpoint
    /// * `model_2_id` - Second endpoint
    /// * `cardinality` - Per-direction bounds; `model1_to_model2` bounds how
    ///   many model-2 records one model-1 record may link to
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Both endpoints are the same model
    /// - The pair is already linked, in either order
    /// - Either model does not exist
    /// - Storage cannot be accessed
    pub fn link_models(
        &self,
        model_1_id: ModelId,
        model_2_id: ModelId,
        cardinality: CardinalitySpec,
    ) -> Result<ModelLink> {
        let link = self
            .backend
            .create_model_link(model_1_id, model_2_id, cardinality)?;

        tracing::info!(
            link_id = %link.id,
            model_1_id = %model_1_id,
            model_2_id = %model_2_id,
            "Models linked"
        );

        Ok(link)
    }

    /// Gets a link definition by id.
    ///
    /// # Errors
    ///
    /// Returns `ModelLinkNotFound` if no link has the id.
    pub fn model_link(&self, link_id: ModelLinkId) -> Result<ModelLink> {
        self.backend.get_model_link(link_id)
    }

    /// Lists all link definitions with endpoint model names resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn model_links(&self) -> Result<Vec<ModelLinkView>> {
        self.backend.list_model_links()
    }

    /// Replaces a link's cardinality bounds.
    ///
    /// Existing record links are re-validated first: a bound cannot shrink
    /// below what any record already holds.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A record's current link count exceeds a requested bound
    /// - The link does not exist
    /// - Storage cannot be accessed
    pub fn update_link(
        &self,
        link_id: ModelLinkId,
        cardinality: CardinalitySpec,
    ) -> Result<ModelLink> {
        let link = self.backend.update_model_link(link_id, cardinality)?;

        tracing::info!(link_id = %link_id, "Link cardinality updated");

        Ok(link)
    }

    // =========================================================================
    // Record Links
    // =========================================================================

    /// Connects two records under a link definition.
    ///
    /// The records may be passed in either order.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The records cannot be oriented onto the link's models
    /// - The pair is already connected
    /// - Either record's side is at its cardinality bound
    /// - The link does not exist
    /// - Storage cannot be accessed
    pub fn link_records(
        &self,
        link_id: ModelLinkId,
        record_a: RecordId,
        record_b: RecordId,
    ) -> Result<RecordLink> {
        let record_link = self.backend.create_record_link(link_id, record_a, record_b)?;

        tracing::info!(
            link_id = %link_id,
            record_link_id = %record_link.id,
            record_1_id = %record_link.record_1_id,
            record_2_id = %record_link.record_2_id,
            "Records linked"
        );

        Ok(record_link)
    }

    /// Removes one record link. The records themselves are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RecordLinkNotFound` when the link definition holds no such
    /// edge; this is never a silent no-op.
    pub fn unlink_records(&self, link_id: ModelLinkId, record_link_id: RecordLinkId) -> Result<()> {
        self.backend.delete_record_link(link_id, record_link_id)?;

        tracing::info!(
            link_id = %link_id,
            record_link_id = %record_link_id,
            "Records unlinked"
        );

        Ok(())
    }

    /// Lists every record link under a link definition, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `ModelLinkNotFound` if no link has the id.
    pub fn record_links(&self, link_id: ModelLinkId) -> Result<Vec<RecordLink>> {
        self.backend.record_links(link_id)
    }

    /// Lists the record links one record participates in under a link
    /// definition.
    ///
    /// # Errors
    ///
    /// Returns `ModelLinkNotFound` if no link has the id.
    pub fn record_links_for(
        &self,
        link_id: ModelLinkId,
        record_id: RecordId,
    ) -> Result<Vec<RecordLink>> {
        self.backend.record_links_for(link_id, record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map as JsonMap, Value as JsonValue};

    use crate::Error;
    use crate::models::{Cardinality, UserId};
    use crate::storage::{RecordBackend, SchemaBackend, SqliteStore};

    fn setup() -> (LinkService, Arc<SqliteStore>, ModelId, ModelId) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let invoice = store.create_model("Invoice", "", UserId::new()).unwrap();
        let customer = store.create_model("Customer", "", UserId::new()).unwrap();
        let service = LinkService::new(store.clone());
        (service, store, invoice.id, customer.id)
    }

    fn record(store: &SqliteStore, model_id: ModelId) -> RecordId {
        store
            .create_record(model_id, &JsonMap::<String, JsonValue>::new())
            .unwrap()
    }

    #[test]
    fn test_link_and_unlink_records() {
        let (service, store, invoice_id, customer_id) = setup();
        let link = service
            .link_models(invoice_id, customer_id, CardinalitySpec::unlimited())
            .unwrap();

        let inv = record(&store, invoice_id);
        let cust = record(&store, customer_id);

        let edge = service.link_records(link.id, inv, cust).unwrap();
        assert_eq!(service.record_links(link.id).unwrap().len(), 1);
        assert_eq!(service.record_links_for(link.id, inv).unwrap().len(), 1);

        service.unlink_records(link.id, edge.id).unwrap();
        assert!(service.record_links(link.id).unwrap().is_empty());

        // The edge is gone; a second unlink reports that.
        let err = service.unlink_records(link.id, edge.id).unwrap_err();
        assert!(matches!(err, Error::RecordLinkNotFound(_)));
    }

    #[test]
    fn test_self_link_rejected() {
        let (service, _store, invoice_id, _) = setup();

        let err = service
            .link_models(invoice_id, invoice_id, CardinalitySpec::unlimited())
            .unwrap_err();
        assert!(matches!(err, Error::SelfLink(id) if id == invoice_id));
    }

    #[test]
    fn test_duplicate_pair_rejected_in_both_orders() {
        let (service, _store, invoice_id, customer_id) = setup();
        service
            .link_models(invoice_id, customer_id, CardinalitySpec::unlimited())
            .unwrap();

        let err = service
            .link_models(customer_id, invoice_id, CardinalitySpec::unlimited())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateLink { .. }));
    }

    #[test]
    fn test_cardinality_bound_enforced() {
        let (service, store, invoice_id, customer_id) = setup();
        // Each invoice may link to at most one customer.
        let link = service
            .link_models(
                invoice_id,
                customer_id,
                CardinalitySpec::new(Cardinality::AtMost(1), Cardinality::Unlimited),
            )
            .unwrap();

        let inv = record(&store, invoice_id);
        let first = record(&store, customer_id);
        let second = record(&store, customer_id);

        service.link_records(link.id, inv, first).unwrap();
        let err = service.link_records(link.id, inv, second).unwrap_err();
        assert!(matches!(err, Error::CardinalityExceeded { .. }));
    }

    #[test]
    fn test_update_link_cannot_shrink_below_held() {
        let (service, store, invoice_id, customer_id) = setup();
        let link = service
            .link_models(invoice_id, customer_id, CardinalitySpec::unlimited())
            .unwrap();

        let inv = record(&store, invoice_id);
        service.link_records(link.id, inv, record(&store, customer_id)).unwrap();
        service.link_records(link.id, inv, record(&store, customer_id)).unwrap();

        let err = service
            .update_link(
                link.id,
                CardinalitySpec::new(Cardinality::AtMost(1), Cardinality::Unlimited),
            )
            .unwrap_err();
        assert!(matches!(err, Error::CardinalityViolation { count: 2, bound: 1 }));

        // A bound that fits the existing edges applies.
        let updated = service
            .update_link(
                link.id,
                CardinalitySpec::new(Cardinality::AtMost(2), Cardinality::Unlimited),
            )
            .unwrap();
        assert_eq!(updated.cardinality.model1_to_model2, Cardinality::AtMost(2));
    }
}
