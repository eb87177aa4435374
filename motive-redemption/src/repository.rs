use crate::codes::CodeDirectory;
use crate::error::{ClaimError, RedeemError};
use crate::models::Redemption;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use motive_shared::StoreError;
use uuid::Uuid;

/// Repository trait for redemptions.
///
/// `insert_claim` and `transition_redeemed` are the two operations where a
/// race directly causes a correctness bug (overselling, double redeem), so
/// implementations must make each a single transactional unit: a SQL store
/// via compare-and-swap or row locks, the in-memory store via one mutex
/// over offers and redemptions.
#[async_trait]
pub trait RedemptionRepository: CodeDirectory {
    /// Atomically re-verify the offer's preconditions (active, within
    /// validity, capacity remaining, no duplicate non-terminal claim for
    /// the same user unless `allow_repeat`), consume one capacity slot and
    /// insert the redemption.
    ///
    /// When capacity runs out under concurrent callers, exactly as many
    /// claims succeed as there were free slots; every other call gets
    /// `CapacityExceeded`.
    async fn insert_claim(
        &self,
        redemption: &Redemption,
        allow_repeat: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ClaimError>;

    async fn get(&self, id: Uuid) -> Result<Option<Redemption>, StoreError>;

    /// Atomic Claimed -> Redeemed transition, stamping `redeemed_at`.
    ///
    /// A redemption past its expiry is flipped to Expired inside the same
    /// unit and reported as `RedemptionExpired`; a terminal one yields
    /// `AlreadyRedeemed` or `RedemptionExpired` by status.
    async fn transition_redeemed(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, RedeemError>;

    /// Flip a single overdue claim to Expired. No-op if already terminal.
    /// Never returns capacity to the offer.
    async fn mark_expired(&self, id: Uuid) -> Result<Redemption, StoreError>;

    /// Expire every claimed redemption past its expiry, returning the ids
    /// flipped. Backs the periodic sweep.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError>;

    /// A user's redemptions, newest first. Feeds the purchased tab.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Redemption>, StoreError>;
}
