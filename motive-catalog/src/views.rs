use crate::offer::Offer;
use crate::repository::OfferRepository;
use chrono::{DateTime, Utc};
use motive_engagement::{CounterSnapshot, CounterStore};
use motive_shared::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Display tabs. Standard tabs only show live offers; Purchased is
/// historical and bypasses the validity filter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    All,
    Featured,
    Saved,
    Purchased,
}

/// Sort keys with deterministic tie-breaking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Featured,
    Newest,
    Discount,
    Expiring,
    PriceLow,
    PriceHigh,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferFilter {
    pub tab: Tab,
    pub category: Option<String>,
    /// Case-insensitive text query over title and description.
    pub query: Option<String>,
}

/// Per-session view state, hydrated once by the display layer: the user's
/// favorited offer ids (via the favorites index) and the offers they hold
/// redemptions for.
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    pub saved: HashSet<Uuid>,
    pub purchased: HashSet<Uuid>,
}

/// One row of a catalog listing, with the lazily computed featured state
/// and the offer's engagement counters folded in.
#[derive(Debug, Clone, Serialize)]
pub struct OfferView {
    pub offer: Offer,
    pub effective_featured: bool,
    pub discount_percentage: u32,
    pub stats: CounterSnapshot,
}

/// Read-only catalog over state owned by the boost scheduler, redemption
/// manager and engagement recorder. Produces filtered, ranked offer views;
/// never mutates anything.
pub struct OfferCatalog {
    offers: Arc<dyn OfferRepository>,
    counters: Arc<dyn CounterStore>,
}

impl OfferCatalog {
    pub fn new(offers: Arc<dyn OfferRepository>, counters: Arc<dyn CounterStore>) -> Self {
        Self { offers, counters }
    }

    /// Filtered, deterministically sorted offer views.
    pub async fn list_offers(
        &self,
        filter: &OfferFilter,
        sort: SortKey,
        viewer: &ViewerContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<OfferView>, StoreError> {
        let mut offers: Vec<Offer> = self
            .offers
            .list()
            .await?
            .into_iter()
            .filter(|offer| Self::matches(offer, filter, viewer, now))
            .collect();

        Self::sort(&mut offers, sort, now);

        let mut views = Vec::with_capacity(offers.len());
        for offer in offers {
            let stats = self.counters.snapshot(offer.id).await?;
            views.push(OfferView {
                effective_featured: offer.effective_featured(now),
                discount_percentage: offer.discount_percentage(),
                stats,
                offer,
            });
        }
        Ok(views)
    }

    fn matches(offer: &Offer, filter: &OfferFilter, viewer: &ViewerContext, now: DateTime<Utc>) -> bool {
        // Historical tabs keep expired, deactivated and archived offers
        // visible.
        let historical = filter.tab == Tab::Purchased;
        if !historical && (!offer.is_active || offer.archived || offer.is_past_validity(now)) {
            return false;
        }

        match filter.tab {
            Tab::All => {}
            Tab::Featured => {
                if !offer.effective_featured(now) {
                    return false;
                }
            }
            Tab::Saved => {
                if !viewer.saved.contains(&offer.id) {
                    return false;
                }
            }
            Tab::Purchased => {
                if !viewer.purchased.contains(&offer.id) {
                    return false;
                }
            }
        }

        if let Some(category) = &filter.category {
            if !offer.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }

        if let Some(query) = &filter.query {
            let query = query.to_lowercase();
            if !offer.title.to_lowercase().contains(&query)
                && !offer.description.to_lowercase().contains(&query)
            {
                return false;
            }
        }

        true
    }

    fn sort(offers: &mut [Offer], sort: SortKey, now: DateTime<Utc>) {
        offers.sort_by(|a, b| {
            let primary = match sort {
                SortKey::Featured => {
                    // Effective-featured band first, newest within each band.
                    let band = |o: &Offer| if o.effective_featured(now) { 0 } else { 1 };
                    band(a).cmp(&band(b)).then(b.created_at.cmp(&a.created_at))
                }
                SortKey::Newest => b.created_at.cmp(&a.created_at),
                SortKey::Discount => b.discount_percentage().cmp(&a.discount_percentage()),
                SortKey::Expiring => a.valid_until.cmp(&b.valid_until),
                SortKey::PriceLow => a.offer_price.cmp(&b.offer_price),
                SortKey::PriceHigh => b.offer_price.cmp(&a.offer_price),
            };
            primary
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}
