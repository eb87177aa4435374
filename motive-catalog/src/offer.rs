use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-windowed promotion state on an offer.
///
/// A boost never turns itself off: readers recompute
/// [`Offer::effective_featured`] on every access, so an expired window
/// simply stops counting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoostState {
    pub is_featured: bool,
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub boost_priority: Option<i32>,
}

/// Authoring input for a new offer.
///
/// Offers are created by the (out-of-scope) authoring collaborator; the
/// engine only validates and stores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    /// Minor currency units.
    pub original_price: i64,
    /// Minor currency units, must not exceed `original_price`.
    pub offer_price: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    /// Claim capacity. Unlimited offers are not representable; use an
    /// explicit large bound instead.
    pub max_redemptions: u32,
}

/// A time- and capacity-bounded promotional record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub original_price: i64,
    pub offer_price: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub max_redemptions: u32,
    /// Consumed capacity. Mutated only by the redemption manager's atomic
    /// claim path; expiry of a claim never decrements it.
    pub current_redemptions: u32,
    pub is_active: bool,
    /// Soft-archive flag. Offers referenced by a non-expired redemption
    /// are archived instead of deleted.
    pub archived: bool,
    pub boost: BoostState,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// Validate a draft and mint a new offer.
    pub fn new(draft: OfferDraft) -> Result<Self, OfferValidationError> {
        if draft.original_price <= 0 {
            return Err(OfferValidationError::NonPositivePrice(draft.original_price));
        }
        if draft.offer_price < 0 || draft.offer_price > draft.original_price {
            return Err(OfferValidationError::PriceAboveOriginal {
                offer: draft.offer_price,
                original: draft.original_price,
            });
        }
        if draft.valid_from > draft.valid_until {
            return Err(OfferValidationError::InvertedValidityWindow);
        }
        if draft.max_redemptions == 0 {
            return Err(OfferValidationError::ZeroCapacity);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            original_price: draft.original_price,
            offer_price: draft.offer_price,
            valid_from: draft.valid_from,
            valid_until: draft.valid_until,
            max_redemptions: draft.max_redemptions,
            current_redemptions: 0,
            is_active: true,
            archived: false,
            boost: BoostState::default(),
            created_at: Utc::now(),
        })
    }

    /// Discount as a whole percentage, rounded half-up.
    pub fn discount_percentage(&self) -> u32 {
        let saved = (self.original_price - self.offer_price) as f64;
        ((saved / self.original_price as f64) * 100.0).round() as u32
    }

    /// Whether `now` falls inside the validity window.
    pub fn is_within_validity(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_from && now <= self.valid_until
    }

    pub fn is_past_validity(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    /// Remaining claim capacity.
    pub fn remaining_capacity(&self) -> u32 {
        self.max_redemptions.saturating_sub(self.current_redemptions)
    }

    /// Lazily evaluated featured state: the boost flag counts only while
    /// its window (if any) has not elapsed. Pure; no write ever occurs.
    pub fn effective_featured(&self, now: DateTime<Utc>) -> bool {
        self.boost.is_featured
            && self
                .boost
                .boost_expires_at
                .map(|expires| expires > now)
                .unwrap_or(true)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OfferValidationError {
    #[error("Original price must be positive, got {0}")]
    NonPositivePrice(i64),

    #[error("Offer price {offer} exceeds original price {original}")]
    PriceAboveOriginal { offer: i64, original: i64 },

    #[error("valid_from is after valid_until")]
    InvertedValidityWindow,

    #[error("max_redemptions must be at least 1")]
    ZeroCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> OfferDraft {
        OfferDraft {
            title: "50% off full detailing".to_string(),
            description: "Interior and exterior detailing package".to_string(),
            category: "Detailing".to_string(),
            original_price: 40_000,
            offer_price: 20_000,
            valid_from: Utc::now() - Duration::days(1),
            valid_until: Utc::now() + Duration::days(30),
            max_redemptions: 50,
        }
    }

    #[test]
    fn test_discount_percentage_rounds() {
        let offer = Offer::new(draft()).unwrap();
        assert_eq!(offer.discount_percentage(), 50);

        let mut d = draft();
        d.original_price = 30_000;
        d.offer_price = 20_000;
        let offer = Offer::new(d).unwrap();
        assert_eq!(offer.discount_percentage(), 33);
    }

    #[test]
    fn test_draft_validation() {
        let mut d = draft();
        d.offer_price = 50_000;
        assert!(matches!(
            Offer::new(d),
            Err(OfferValidationError::PriceAboveOriginal { .. })
        ));

        let mut d = draft();
        d.max_redemptions = 0;
        assert!(matches!(Offer::new(d), Err(OfferValidationError::ZeroCapacity)));

        let mut d = draft();
        d.valid_from = d.valid_until + Duration::seconds(1);
        assert!(matches!(
            Offer::new(d),
            Err(OfferValidationError::InvertedValidityWindow)
        ));
    }

    #[test]
    fn test_effective_featured_lazy_expiry() {
        let mut offer = Offer::new(draft()).unwrap();
        let now = Utc::now();

        assert!(!offer.effective_featured(now));

        offer.boost = BoostState {
            is_featured: true,
            boost_expires_at: Some(now + Duration::hours(1)),
            boost_priority: Some(5),
        };
        assert!(offer.effective_featured(now));
        // One tick past the window, still no write anywhere.
        assert!(!offer.effective_featured(now + Duration::hours(1) + Duration::seconds(1)));

        // No window at all means featured until revoked.
        offer.boost.boost_expires_at = None;
        assert!(offer.effective_featured(now + Duration::days(365)));
    }
}
