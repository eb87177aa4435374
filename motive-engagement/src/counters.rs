use async_trait::async_trait;
use motive_shared::{EngagementEvent, StoreError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw per-offer counter values.
///
/// Counters only ever increase; increments are commutative, so the store
/// may apply concurrent events in any order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub impressions: u64,
    pub clicks: u64,
    pub views: u64,
    pub shares: u64,
    pub claims: u64,
    pub redeemed: u64,
}

/// Aggregate view of an offer's engagement, with derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferStats {
    pub offer_id: Uuid,
    pub total_impressions: u64,
    pub total_views: u64,
    pub total_clicks: u64,
    pub total_shares: u64,
    pub total_claims: u64,
    pub redeemed_count: u64,
    /// redeemed / claims, 0 when there are no claims.
    pub redemption_rate: f64,
    /// redeemed x offer_price, in minor currency units.
    pub revenue: i64,
}

/// Store for aggregate engagement counters.
///
/// Implementations must provide atomic increment semantics: concurrent
/// `apply` calls never lose updates, and counters never decrease.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Fold one event into the counters.
    ///
    /// When `idempotency_key` is given, a key seen before is a no-op and
    /// returns `false`; this protects against transport retries
    /// double-counting a logical event.
    async fn apply(
        &self,
        event: &EngagementEvent,
        idempotency_key: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Bump the redeemed counter for an offer.
    async fn increment_redeemed(&self, offer_id: Uuid) -> Result<(), StoreError>;

    /// Read the current counter values. Missing offers read as all zero.
    async fn snapshot(&self, offer_id: Uuid) -> Result<CounterSnapshot, StoreError>;
}

/// Read-side seam for offer pricing, used to derive revenue.
///
/// Implemented by the store over the offer catalog so the engagement crate
/// does not depend on the catalog itself.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// The discounted price of an offer in minor currency units, if the
    /// offer exists.
    async fn offer_price(&self, offer_id: Uuid) -> Result<Option<i64>, StoreError>;
}
