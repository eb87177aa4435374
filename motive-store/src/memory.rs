use async_trait::async_trait;
use chrono::{DateTime, Utc};
use motive_catalog::{BoostState, Offer, OfferRepository};
use motive_engagement::{CounterSnapshot, CounterStore, PriceSource};
use motive_favorites::FavoriteRepository;
use motive_redemption::{
    ClaimError, CodeDirectory, Redemption, RedemptionRepository, RedemptionStatus, RedeemError,
};
use motive_shared::{EngagementEvent, EntityKind, EventKind, StoreError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Per-offer counters with atomic increment semantics. Cells are shared
/// out of the map lock, so concurrent bumps never contend on it.
#[derive(Default)]
struct CounterCell {
    impressions: AtomicU64,
    clicks: AtomicU64,
    views: AtomicU64,
    shares: AtomicU64,
    claims: AtomicU64,
    redeemed: AtomicU64,
}

#[derive(Default)]
struct CoreState {
    offers: HashMap<Uuid, Offer>,
    redemptions: HashMap<Uuid, Redemption>,
    /// Every code ever issued; stands in for a SQL unique constraint.
    codes: HashSet<String>,
}

/// In-memory store implementing every repository trait in the workspace.
///
/// Offers, redemptions and the code directory share one mutex, which makes
/// `insert_claim` and `transition_redeemed` single transactional units -
/// the in-memory equivalent of the compare-and-swap/row-lock guarantee a
/// SQL implementation would provide. The lock is never held across an
/// await point.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<CoreState>,
    counters: Mutex<HashMap<Uuid, Arc<CounterCell>>>,
    delivered_keys: Mutex<HashSet<String>>,
    favorites: Mutex<HashSet<(String, EntityKind, Uuid)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, offer_id: Uuid) -> Arc<CounterCell> {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.entry(offer_id).or_default().clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn insert(&self, offer: &Offer) -> Result<(), StoreError> {
        let mut state = self.lock_state();
        if state.offers.contains_key(&offer.id) {
            return Err(StoreError::Conflict(offer.id.to_string()));
        }
        state.offers.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Offer>, StoreError> {
        Ok(self.lock_state().offers.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Offer>, StoreError> {
        Ok(self.lock_state().offers.values().cloned().collect())
    }

    async fn update_boost(&self, id: Uuid, boost: BoostState) -> Result<Offer, StoreError> {
        let mut state = self.lock_state();
        let offer = state
            .offers
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        offer.boost = boost;
        Ok(offer.clone())
    }

    async fn archive(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock_state();
        let offer = state
            .offers
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        offer.archived = true;
        tracing::info!(offer_id = %id, "offer archived");
        Ok(())
    }
}

#[async_trait]
impl CodeDirectory for MemoryStore {
    async fn code_exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.lock_state().codes.contains(code))
    }
}

#[async_trait]
impl RedemptionRepository for MemoryStore {
    async fn insert_claim(
        &self,
        redemption: &Redemption,
        allow_repeat: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ClaimError> {
        let mut state = self.lock_state();

        let duplicate = state.redemptions.values().any(|r| {
            r.offer_id == redemption.offer_id
                && r.user_id == redemption.user_id
                && (!allow_repeat || !r.is_terminal())
        });
        if duplicate {
            return Err(ClaimError::DuplicateClaim);
        }
        if state.codes.contains(&redemption.code) {
            // Lost the race between generation and insert; the unique
            // constraint wins.
            return Err(ClaimError::Store(StoreError::Conflict(
                redemption.code.clone(),
            )));
        }

        let offer = state
            .offers
            .get_mut(&redemption.offer_id)
            .ok_or(ClaimError::OfferNotFound(redemption.offer_id))?;
        if !offer.is_active || offer.archived {
            return Err(ClaimError::OfferInactive(offer.id));
        }
        if offer.is_past_validity(now) {
            return Err(ClaimError::OfferExpired(offer.id));
        }
        if offer.remaining_capacity() == 0 {
            return Err(ClaimError::CapacityExceeded(offer.id));
        }
        offer.current_redemptions += 1;

        state.codes.insert(redemption.code.clone());
        state.redemptions.insert(redemption.id, redemption.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Redemption>, StoreError> {
        Ok(self.lock_state().redemptions.get(&id).cloned())
    }

    async fn transition_redeemed(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, RedeemError> {
        let mut state = self.lock_state();
        let redemption = state
            .redemptions
            .get_mut(&id)
            .ok_or(RedeemError::NotFound(id))?;

        match redemption.status {
            RedemptionStatus::Redeemed => return Err(RedeemError::AlreadyRedeemed(id)),
            RedemptionStatus::Expired => return Err(RedeemError::RedemptionExpired(id)),
            RedemptionStatus::Claimed => {}
        }
        if now > redemption.expires_at {
            // Lazy expiry inside the same transactional unit; the consumed
            // capacity slot stays consumed.
            redemption.status = RedemptionStatus::Expired;
            return Err(RedeemError::RedemptionExpired(id));
        }

        redemption.status = RedemptionStatus::Redeemed;
        redemption.redeemed_at = Some(now);
        Ok(redemption.clone())
    }

    async fn mark_expired(&self, id: Uuid) -> Result<Redemption, StoreError> {
        let mut state = self.lock_state();
        let redemption = state
            .redemptions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if redemption.status == RedemptionStatus::Claimed {
            redemption.status = RedemptionStatus::Expired;
        }
        Ok(redemption.clone())
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let mut state = self.lock_state();
        let mut flipped = Vec::new();
        for redemption in state.redemptions.values_mut() {
            if redemption.is_expiry_due(now) {
                redemption.status = RedemptionStatus::Expired;
                flipped.push(redemption.id);
            }
        }
        if !flipped.is_empty() {
            tracing::debug!(count = flipped.len(), "flipped overdue redemptions to expired");
        }
        Ok(flipped)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Redemption>, StoreError> {
        let state = self.lock_state();
        let mut out: Vec<Redemption> = state
            .redemptions
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.claimed_at.cmp(&a.claimed_at));
        Ok(out)
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn apply(
        &self,
        event: &EngagementEvent,
        idempotency_key: Option<&str>,
    ) -> Result<bool, StoreError> {
        if let Some(key) = idempotency_key {
            let mut keys = self.delivered_keys.lock().unwrap_or_else(|e| e.into_inner());
            if !keys.insert(key.to_string()) {
                return Ok(false);
            }
        }

        let cell = self.cell(event.offer_id);
        let counter = match event.kind {
            EventKind::Impression => &cell.impressions,
            EventKind::Click => &cell.clicks,
            EventKind::View => &cell.views,
            EventKind::Share => &cell.shares,
            EventKind::Claim => &cell.claims,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    async fn increment_redeemed(&self, offer_id: Uuid) -> Result<(), StoreError> {
        self.cell(offer_id).redeemed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn snapshot(&self, offer_id: Uuid) -> Result<CounterSnapshot, StoreError> {
        let cell = self.cell(offer_id);
        Ok(CounterSnapshot {
            impressions: cell.impressions.load(Ordering::Relaxed),
            clicks: cell.clicks.load(Ordering::Relaxed),
            views: cell.views.load(Ordering::Relaxed),
            shares: cell.shares.load(Ordering::Relaxed),
            claims: cell.claims.load(Ordering::Relaxed),
            redeemed: cell.redeemed.load(Ordering::Relaxed),
        })
    }
}

#[async_trait]
impl PriceSource for MemoryStore {
    async fn offer_price(&self, offer_id: Uuid) -> Result<Option<i64>, StoreError> {
        Ok(self.lock_state().offers.get(&offer_id).map(|o| o.offer_price))
    }
}

#[async_trait]
impl FavoriteRepository for MemoryStore {
    async fn favorites_for(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, bool>, StoreError> {
        let favorites = self.favorites.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entity_ids
            .iter()
            .map(|id| {
                let key = (user_id.to_string(), kind, *id);
                (*id, favorites.contains(&key))
            })
            .collect())
    }

    async fn toggle(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut favorites = self.favorites.lock().unwrap_or_else(|e| e.into_inner());
        let key = (user_id.to_string(), kind, entity_id);
        if favorites.remove(&key) {
            Ok(false)
        } else {
            favorites.insert(key);
            Ok(true)
        }
    }
}
