use crate::counters::{CounterStore, OfferStats, PriceSource};
use crate::dedup::SessionDedup;
use motive_shared::{EngagementEvent, EventKind, StoreError};
use std::sync::Arc;
use uuid::Uuid;

/// Ingests engagement events and maintains per-offer aggregate counters.
///
/// Recording is best-effort: a failed counter write is logged and dropped,
/// never surfaced to the caller, so analytics can never block or fail the
/// claim/redeem path.
pub struct EngagementRecorder {
    counters: Arc<dyn CounterStore>,
    prices: Arc<dyn PriceSource>,
}

impl EngagementRecorder {
    pub fn new(counters: Arc<dyn CounterStore>, prices: Arc<dyn PriceSource>) -> Self {
        Self { counters, prices }
    }

    /// Record an impression, at most once per (offer, viewer) within the
    /// given session.
    ///
    /// The caller is contractually responsible for only invoking this once
    /// its own visibility threshold is met; no visibility detection happens
    /// here.
    pub async fn record_impression(
        &self,
        session: &SessionDedup,
        offer_id: Uuid,
        viewer_key: &str,
        source: Option<&str>,
    ) {
        if !session.first_sighting(offer_id, viewer_key) {
            return;
        }
        self.record(offer_id, viewer_key, EventKind::Impression, source, None)
            .await;
    }

    pub async fn record_click(
        &self,
        offer_id: Uuid,
        viewer_key: &str,
        source: Option<&str>,
        idempotency_key: Option<&str>,
    ) {
        self.record(offer_id, viewer_key, EventKind::Click, source, idempotency_key)
            .await;
    }

    pub async fn record_view(
        &self,
        offer_id: Uuid,
        viewer_key: &str,
        source: Option<&str>,
        idempotency_key: Option<&str>,
    ) {
        self.record(offer_id, viewer_key, EventKind::View, source, idempotency_key)
            .await;
    }

    pub async fn record_share(
        &self,
        offer_id: Uuid,
        viewer_key: &str,
        source: Option<&str>,
        idempotency_key: Option<&str>,
    ) {
        self.record(offer_id, viewer_key, EventKind::Share, source, idempotency_key)
            .await;
    }

    /// Record a claim event. Emitted by the redemption manager on every
    /// successful claim.
    pub async fn record_claim(&self, offer_id: Uuid, user_id: &str, source: Option<&str>) {
        self.record(offer_id, user_id, EventKind::Claim, source, None)
            .await;
    }

    /// Bump the redeemed counter. Best-effort, same as event recording.
    pub async fn note_redeemed(&self, offer_id: Uuid) {
        if let Err(err) = self.counters.increment_redeemed(offer_id).await {
            tracing::warn!(%offer_id, error = %err, "dropping redeemed counter update");
        }
    }

    async fn record(
        &self,
        offer_id: Uuid,
        viewer_key: &str,
        kind: EventKind,
        source: Option<&str>,
        idempotency_key: Option<&str>,
    ) {
        let mut event = EngagementEvent::new(offer_id, viewer_key, kind);
        if let Some(source) = source {
            event = event.with_source(source);
        }

        match self.counters.apply(&event, idempotency_key).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(%offer_id, ?kind, "duplicate delivery suppressed by idempotency key");
            }
            Err(err) => {
                tracing::warn!(%offer_id, ?kind, error = %err, "dropping engagement event");
            }
        }
    }

    /// Aggregate counters for an offer, with derived rate and revenue.
    pub async fn aggregate(&self, offer_id: Uuid) -> Result<OfferStats, StoreError> {
        let snapshot = self.counters.snapshot(offer_id).await?;
        let price = self.prices.offer_price(offer_id).await?.unwrap_or(0);

        let redemption_rate = if snapshot.claims == 0 {
            0.0
        } else {
            snapshot.redeemed as f64 / snapshot.claims as f64
        };

        Ok(OfferStats {
            offer_id,
            total_impressions: snapshot.impressions,
            total_views: snapshot.views,
            total_clicks: snapshot.clicks,
            total_shares: snapshot.shares,
            total_claims: snapshot.claims,
            redeemed_count: snapshot.redeemed,
            redemption_rate,
            revenue: snapshot.redeemed as i64 * price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::CounterSnapshot;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubCounters {
        counts: Mutex<HashMap<Uuid, CounterSnapshot>>,
        keys: Mutex<HashSet<String>>,
        fail: bool,
    }

    #[async_trait]
    impl CounterStore for StubCounters {
        async fn apply(
            &self,
            event: &EngagementEvent,
            idempotency_key: Option<&str>,
        ) -> Result<bool, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("stub down".into()));
            }
            if let Some(key) = idempotency_key {
                if !self.keys.lock().unwrap().insert(key.to_string()) {
                    return Ok(false);
                }
            }
            let mut counts = self.counts.lock().unwrap();
            let cell = counts.entry(event.offer_id).or_default();
            match event.kind {
                EventKind::Impression => cell.impressions += 1,
                EventKind::Click => cell.clicks += 1,
                EventKind::View => cell.views += 1,
                EventKind::Share => cell.shares += 1,
                EventKind::Claim => cell.claims += 1,
            }
            Ok(true)
        }

        async fn increment_redeemed(&self, offer_id: Uuid) -> Result<(), StoreError> {
            self.counts.lock().unwrap().entry(offer_id).or_default().redeemed += 1;
            Ok(())
        }

        async fn snapshot(&self, offer_id: Uuid) -> Result<CounterSnapshot, StoreError> {
            Ok(self
                .counts
                .lock()
                .unwrap()
                .get(&offer_id)
                .copied()
                .unwrap_or_default())
        }
    }

    struct FixedPrice(i64);

    #[async_trait]
    impl PriceSource for FixedPrice {
        async fn offer_price(&self, _offer_id: Uuid) -> Result<Option<i64>, StoreError> {
            Ok(Some(self.0))
        }
    }

    fn recorder(counters: Arc<StubCounters>) -> EngagementRecorder {
        EngagementRecorder::new(counters, Arc::new(FixedPrice(5_000)))
    }

    #[tokio::test]
    async fn test_impression_deduped_within_session() {
        let counters = Arc::new(StubCounters::default());
        let rec = recorder(counters.clone());
        let session = SessionDedup::new();
        let offer = Uuid::new_v4();

        rec.record_impression(&session, offer, "viewer-1", Some("offers_page"))
            .await;
        rec.record_impression(&session, offer, "viewer-1", Some("offers_page"))
            .await;
        rec.record_impression(&session, offer, "viewer-2", None).await;

        let stats = rec.aggregate(offer).await.unwrap();
        assert_eq!(stats.total_impressions, 2);
    }

    #[tokio::test]
    async fn test_new_session_counts_again() {
        let counters = Arc::new(StubCounters::default());
        let rec = recorder(counters.clone());
        let offer = Uuid::new_v4();

        let first = SessionDedup::new();
        rec.record_impression(&first, offer, "viewer-1", None).await;
        let second = SessionDedup::new();
        rec.record_impression(&second, offer, "viewer-1", None).await;

        assert_eq!(rec.aggregate(offer).await.unwrap().total_impressions, 2);
    }

    #[tokio::test]
    async fn test_idempotency_key_suppresses_retry() {
        let counters = Arc::new(StubCounters::default());
        let rec = recorder(counters.clone());
        let offer = Uuid::new_v4();

        rec.record_click(offer, "viewer-1", None, Some("evt-1")).await;
        rec.record_click(offer, "viewer-1", None, Some("evt-1")).await;
        rec.record_click(offer, "viewer-1", None, Some("evt-2")).await;

        assert_eq!(rec.aggregate(offer).await.unwrap().total_clicks, 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let counters = Arc::new(StubCounters {
            fail: true,
            ..Default::default()
        });
        let rec = recorder(counters);
        let session = SessionDedup::new();

        // Must not panic or error; the failure is logged and dropped.
        rec.record_impression(&session, Uuid::new_v4(), "viewer-1", None)
            .await;
        rec.record_view(Uuid::new_v4(), "viewer-1", None, None).await;
    }

    #[tokio::test]
    async fn test_aggregate_derived_fields() {
        let counters = Arc::new(StubCounters::default());
        let rec = recorder(counters);
        let offer = Uuid::new_v4();

        assert_eq!(rec.aggregate(offer).await.unwrap().redemption_rate, 0.0);

        for i in 0..4 {
            rec.record_claim(offer, &format!("user-{i}"), None).await;
        }
        rec.note_redeemed(offer).await;
        rec.note_redeemed(offer).await;

        let stats = rec.aggregate(offer).await.unwrap();
        assert_eq!(stats.total_claims, 4);
        assert_eq!(stats.redeemed_count, 2);
        assert!((stats.redemption_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.revenue, 10_000);
    }
}
