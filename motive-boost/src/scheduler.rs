use chrono::{DateTime, Duration, Utc};
use motive_catalog::{BoostState, Offer, OfferRepository};
use motive_shared::StoreError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A promotion window to place on an offer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoostPlan {
    /// Window length in seconds from the moment of application.
    pub duration_secs: i64,
    pub priority: i32,
}

impl BoostPlan {
    pub fn for_days(days: i64, priority: i32) -> Self {
        Self {
            duration_secs: days * 24 * 60 * 60,
            priority,
        }
    }

    fn window(&self) -> Duration {
        Duration::seconds(self.duration_secs)
    }
}

/// Manages time-bounded "featured" windows on offers.
///
/// Writes are last-writer-wins and low frequency (admin actions); the
/// effective featured state is recomputed lazily on every catalog read, so
/// no background job is needed to turn an elapsed window off.
pub struct BoostScheduler {
    offers: Arc<dyn OfferRepository>,
}

impl BoostScheduler {
    pub fn new(offers: Arc<dyn OfferRepository>) -> Self {
        Self { offers }
    }

    /// Apply a boost window. Re-applying replaces the current window
    /// rather than extending or stacking it.
    pub async fn apply_boost(&self, offer_id: Uuid, plan: BoostPlan) -> Result<Offer, BoostError> {
        self.apply_at(offer_id, plan, Utc::now()).await
    }

    /// Like [`apply_boost`](Self::apply_boost) with an explicit clock, for
    /// deterministic scheduling and tests.
    pub async fn apply_at(
        &self,
        offer_id: Uuid,
        plan: BoostPlan,
        now: DateTime<Utc>,
    ) -> Result<Offer, BoostError> {
        let boost = BoostState {
            is_featured: true,
            boost_expires_at: Some(now + plan.window()),
            boost_priority: Some(plan.priority),
        };

        let offer = self
            .offers
            .update_boost(offer_id, boost)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => BoostError::OfferNotFound(offer_id),
                other => BoostError::Store(other),
            })?;

        tracing::info!(%offer_id, priority = plan.priority, duration_secs = plan.duration_secs, "boost applied");
        Ok(offer)
    }

    /// Apply a plan to many offers independently. One failure never blocks
    /// the rest; the caller gets a result per id, in input order.
    pub async fn bulk_apply(
        &self,
        offer_ids: &[Uuid],
        plan: BoostPlan,
    ) -> Vec<(Uuid, Result<Offer, BoostError>)> {
        let now = Utc::now();
        let mut results = Vec::with_capacity(offer_ids.len());
        for &offer_id in offer_ids {
            results.push((offer_id, self.apply_at(offer_id, plan, now).await));
        }
        results
    }

    /// Immediate admin override: clear the boost state outright instead of
    /// waiting for lazy expiry.
    pub async fn revoke_boost(&self, offer_id: Uuid) -> Result<Offer, BoostError> {
        let offer = self
            .offers
            .update_boost(offer_id, BoostState::default())
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => BoostError::OfferNotFound(offer_id),
                other => BoostError::Store(other),
            })?;

        tracing::info!(%offer_id, "boost revoked");
        Ok(offer)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BoostError {
    #[error("Offer not found: {0}")]
    OfferNotFound(Uuid),

    #[error(transparent)]
    Store(StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use motive_catalog::OfferDraft;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubOffers {
        offers: Mutex<HashMap<Uuid, Offer>>,
    }

    #[async_trait]
    impl OfferRepository for StubOffers {
        async fn insert(&self, offer: &Offer) -> Result<(), StoreError> {
            self.offers.lock().unwrap().insert(offer.id, offer.clone());
            Ok(())
        }

        async fn get(&self, id: Uuid) -> Result<Option<Offer>, StoreError> {
            Ok(self.offers.lock().unwrap().get(&id).cloned())
        }

        async fn list(&self) -> Result<Vec<Offer>, StoreError> {
            Ok(self.offers.lock().unwrap().values().cloned().collect())
        }

        async fn update_boost(&self, id: Uuid, boost: BoostState) -> Result<Offer, StoreError> {
            let mut offers = self.offers.lock().unwrap();
            let offer = offers
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            offer.boost = boost;
            Ok(offer.clone())
        }

        async fn archive(&self, _id: Uuid) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn sample_offer() -> Offer {
        Offer::new(OfferDraft {
            title: "AC service special".to_string(),
            description: "Full AC inspection and regas".to_string(),
            category: "AC Service".to_string(),
            original_price: 30_000,
            offer_price: 21_000,
            valid_from: Utc::now(),
            valid_until: Utc::now() + Duration::days(30),
            max_redemptions: 20,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_apply_boost_sets_window() {
        let repo = Arc::new(StubOffers::default());
        let offer = sample_offer();
        repo.insert(&offer).await.unwrap();
        let scheduler = BoostScheduler::new(repo);

        let now = Utc::now();
        let boosted = scheduler
            .apply_at(offer.id, BoostPlan::for_days(7, 3), now)
            .await
            .unwrap();

        assert!(boosted.boost.is_featured);
        assert_eq!(boosted.boost.boost_priority, Some(3));
        assert_eq!(boosted.boost.boost_expires_at, Some(now + Duration::days(7)));
        assert!(boosted.effective_featured(now));
    }

    #[tokio::test]
    async fn test_reapply_replaces_window() {
        let repo = Arc::new(StubOffers::default());
        let offer = sample_offer();
        repo.insert(&offer).await.unwrap();
        let scheduler = BoostScheduler::new(repo);

        let now = Utc::now();
        scheduler
            .apply_at(offer.id, BoostPlan::for_days(30, 1), now)
            .await
            .unwrap();
        let reapplied = scheduler
            .apply_at(offer.id, BoostPlan::for_days(7, 2), now)
            .await
            .unwrap();

        // Replaced, not stacked to 37 days.
        assert_eq!(reapplied.boost.boost_expires_at, Some(now + Duration::days(7)));
        assert_eq!(reapplied.boost.boost_priority, Some(2));
    }

    #[tokio::test]
    async fn test_bulk_apply_isolates_failures() {
        let repo = Arc::new(StubOffers::default());
        let a = sample_offer();
        let b = sample_offer();
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();
        let scheduler = BoostScheduler::new(repo);

        let missing = Uuid::new_v4();
        let results = scheduler
            .bulk_apply(&[a.id, missing, b.id], BoostPlan::for_days(3, 1))
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(BoostError::OfferNotFound(id)) if id == missing));
        assert!(results[2].1.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_clears_state() {
        let repo = Arc::new(StubOffers::default());
        let offer = sample_offer();
        repo.insert(&offer).await.unwrap();
        let scheduler = BoostScheduler::new(repo.clone());

        scheduler
            .apply_boost(offer.id, BoostPlan::for_days(7, 1))
            .await
            .unwrap();
        let revoked = scheduler.revoke_boost(offer.id).await.unwrap();

        assert_eq!(revoked.boost, BoostState::default());
        assert!(!revoked.effective_featured(Utc::now()));
    }
}
