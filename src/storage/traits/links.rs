//! Link storage trait definitions.

use crate::Result;
use crate::models::{
    CardinalitySpec, ModelId, ModelLink, ModelLinkId, ModelLinkView, RecordId, RecordLink,
    RecordLinkId,
};

/// Trait for link storage backends.
///
/// Model links declare which models may be connected; record links are the
/// connections themselves, stored in one edge table per model link.
/// Implementations must be thread-safe (`Send + Sync`).
pub trait LinkBackend: Send + Sync {
    /// Creates a link between two distinct models and its empty edge table.
    ///
    /// # Errors
    ///
    /// Returns `SelfLink` when both endpoints are the same model and
    /// `DuplicateLink` when the pair is already linked in either order.
    fn create_model_link(
        &self,
        model_1_id: ModelId,
        model_2_id: ModelId,
        cardinality: CardinalitySpec,
    ) -> Result<ModelLink>;

    /// Gets a model link by id.
    fn get_model_link(&self, link_id: ModelLinkId) -> Result<ModelLink>;

    /// Lists all model links with endpoint model names, in creation order.
    fn list_model_links(&self) -> Result<Vec<ModelLinkView>>;

    /// Replaces a link's cardinality bounds.
    ///
    /// # Errors
    ///
    /// Returns `CardinalityViolation` when existing record links already
    /// exceed a requested bound.
    fn update_model_link(
        &self,
        link_id: ModelLinkId,
        cardinality: CardinalitySpec,
    ) -> Result<ModelLink>;

    /// Connects two records under a model link.
    ///
    /// The records may be passed in either order; storage orients them to
    /// the link's model-1 and model-2 sides.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRecordLink` when the pair is already connected and
    /// `CardinalityExceeded` when either side's bound is full.
    fn create_record_link(
        &self,
        link_id: ModelLinkId,
        record_a: RecordId,
        record_b: RecordId,
    ) -> Result<RecordLink>;

    /// Removes one record link.
    fn delete_record_link(&self, link_id: ModelLinkId, record_link_id: RecordLinkId)
    -> Result<()>;

    /// Lists all record links under a model link, in creation order.
    fn record_links(&self, link_id: ModelLinkId) -> Result<Vec<RecordLink>>;

    /// Lists the record links a single record participates in under a model
    /// link.
    fn record_links_for(&self, link_id: ModelLinkId, record_id: RecordId)
    -> Result<Vec<RecordLink>>;
}
