use crate::offer::{BoostState, Offer};
use async_trait::async_trait;
use motive_shared::StoreError;
use uuid::Uuid;

/// Repository trait for offer records.
///
/// The capacity counter is deliberately absent here: it moves only through
/// the redemption repository's atomic claim path.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn insert(&self, offer: &Offer) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Offer>, StoreError>;

    /// Every offer, archived included; the catalog applies view filtering
    /// on top, so historical tabs can still reach archived records.
    async fn list(&self) -> Result<Vec<Offer>, StoreError>;

    /// Replace an offer's boost state, returning the updated record.
    /// Last-writer-wins; re-applying replaces the window rather than
    /// stacking it.
    async fn update_boost(&self, id: Uuid, boost: BoostState) -> Result<Offer, StoreError>;

    /// Soft-archive an offer. Archived offers drop out of the standard
    /// catalog tabs but stay visible on historical ones and keep their
    /// redemptions resolvable.
    async fn archive(&self, id: Uuid) -> Result<(), StoreError>;
}
