use crate::codes::CodeGenerator;
use crate::error::{ClaimError, RedeemError};
use crate::models::Redemption;
use crate::repository::RedemptionRepository;
use chrono::{DateTime, Duration, Utc};
use motive_catalog::OfferRepository;
use motive_engagement::EngagementRecorder;
use motive_shared::StoreError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// How a claim's expiry timestamp is chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExpiryPolicy {
    /// The claim lives exactly as long as the offer itself.
    OfferValidUntil,
    /// Fixed TTL from the moment of claiming.
    FixedTtl { days: i64 },
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        // The original platform gave claims 30 days.
        Self::FixedTtl { days: 30 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedemptionPolicy {
    pub expiry: ExpiryPolicy,
    /// When enabled, a user may claim the same offer again once their
    /// previous claim has reached a terminal state.
    pub allow_repeat_claims: bool,
}

/// Drives the claim -> redeem -> expire state machine and enforces offer
/// capacity.
///
/// Capacity and duplicate checks happen inside the repository's atomic
/// claim unit; this manager sequences validation, code issuance and
/// best-effort analytics around it.
pub struct RedemptionManager {
    offers: Arc<dyn OfferRepository>,
    redemptions: Arc<dyn RedemptionRepository>,
    recorder: Arc<EngagementRecorder>,
    codes: CodeGenerator,
    policy: RedemptionPolicy,
}

impl RedemptionManager {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        redemptions: Arc<dyn RedemptionRepository>,
        recorder: Arc<EngagementRecorder>,
        codes: CodeGenerator,
        policy: RedemptionPolicy,
    ) -> Self {
        Self {
            offers,
            redemptions,
            recorder,
            codes,
            policy,
        }
    }

    /// Reserve one unit of an offer's capacity for a user.
    ///
    /// The display layer calls this only after the payment gateway has
    /// confirmed payment; nothing here inspects payment state.
    pub async fn claim(&self, offer_id: Uuid, user_id: &str) -> Result<Redemption, ClaimError> {
        self.claim_at(offer_id, user_id, Utc::now()).await
    }

    pub async fn claim_at(
        &self,
        offer_id: Uuid,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Redemption, ClaimError> {
        let offer = self
            .offers
            .get(offer_id)
            .await
            .map_err(ClaimError::Store)?
            .ok_or(ClaimError::OfferNotFound(offer_id))?;

        // Fast-fail on a stale read; the repository re-checks all of this
        // inside the atomic claim unit.
        if !offer.is_active || offer.archived {
            return Err(ClaimError::OfferInactive(offer_id));
        }
        if offer.is_past_validity(now) {
            return Err(ClaimError::OfferExpired(offer_id));
        }
        if offer.remaining_capacity() == 0 {
            return Err(ClaimError::CapacityExceeded(offer_id));
        }

        let code = self.codes.generate(self.redemptions.as_ref()).await?;
        let expires_at = match self.policy.expiry {
            ExpiryPolicy::OfferValidUntil => offer.valid_until,
            ExpiryPolicy::FixedTtl { days } => now + Duration::days(days),
        };

        let redemption = Redemption::new(offer_id, user_id, code, now, expires_at);
        self.redemptions
            .insert_claim(&redemption, self.policy.allow_repeat_claims, now)
            .await?;

        tracing::info!(%offer_id, user_id, redemption_id = %redemption.id, "claim accepted");
        self.recorder
            .record_claim(offer_id, user_id, Some("redemption_manager"))
            .await;

        Ok(redemption)
    }

    /// Redeem a claimed redemption exactly once.
    pub async fn redeem(&self, redemption_id: Uuid) -> Result<Redemption, RedeemError> {
        self.redeem_at(redemption_id, Utc::now()).await
    }

    pub async fn redeem_at(
        &self,
        redemption_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, RedeemError> {
        let redemption = self
            .redemptions
            .transition_redeemed(redemption_id, now)
            .await?;

        tracing::info!(redemption_id = %redemption.id, offer_id = %redemption.offer_id, "redeemed");
        self.recorder.note_redeemed(redemption.offer_id).await;

        Ok(redemption)
    }

    /// Fetch a redemption, lazily expiring it if its window has passed.
    pub async fn get(&self, redemption_id: Uuid) -> Result<Option<Redemption>, StoreError> {
        self.get_at(redemption_id, Utc::now()).await
    }

    pub async fn get_at(
        &self,
        redemption_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Redemption>, StoreError> {
        let Some(redemption) = self.redemptions.get(redemption_id).await? else {
            return Ok(None);
        };

        if redemption.is_expiry_due(now) {
            return self.redemptions.mark_expired(redemption_id).await.map(Some);
        }
        Ok(Some(redemption))
    }

    /// Periodic sweep: flip every overdue claim to Expired. Consumed
    /// capacity slots stay consumed.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let expired = self.redemptions.expire_due(now).await?;
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired overdue claims");
        }
        Ok(expired.len())
    }

    /// A user's redemptions, for the purchased tab and wallet views.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Redemption>, StoreError> {
        self.redemptions.list_for_user(user_id).await
    }
}
