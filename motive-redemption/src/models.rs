use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Redemption lifecycle. Transitions only move forward:
/// Claimed -> Redeemed or Claimed -> Expired, and both end states are
/// terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionStatus {
    Claimed,
    Redeemed,
    Expired,
}

/// One claimed unit of an offer's capacity, identified by a globally
/// unique code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub user_id: String,
    pub code: String,
    pub status: RedemptionStatus,
    pub claimed_at: DateTime<Utc>,
    /// Set exactly once, on the transition to Redeemed.
    pub redeemed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Redemption {
    pub fn new(
        offer_id: Uuid,
        user_id: impl Into<String>,
        code: String,
        claimed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            offer_id,
            user_id: user_id.into(),
            code,
            status: RedemptionStatus::Claimed,
            claimed_at,
            redeemed_at: None,
            expires_at,
        }
    }

    /// Terminal redemptions are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RedemptionStatus::Redeemed | RedemptionStatus::Expired)
    }

    /// A still-claimed redemption whose expiry has passed. Such records
    /// are flipped to Expired lazily on read or by the sweep.
    pub fn is_expiry_due(&self, now: DateTime<Utc>) -> bool {
        self.status == RedemptionStatus::Claimed && now > self.expires_at
    }
}
