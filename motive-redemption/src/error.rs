use motive_shared::StoreError;
use uuid::Uuid;

/// Why a claim was refused. Returned as typed results for user-facing
/// messaging, never used as control flow.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Offer not found: {0}")]
    OfferNotFound(Uuid),

    #[error("Offer is not active: {0}")]
    OfferInactive(Uuid),

    #[error("Offer validity window has passed: {0}")]
    OfferExpired(Uuid),

    #[error("Offer capacity exhausted: {0}")]
    CapacityExceeded(Uuid),

    #[error("User already holds a claim on this offer")]
    DuplicateClaim,

    #[error("Could not issue a unique code after {0} attempts")]
    CodeGenerationFailed(u32),

    #[error(transparent)]
    Store(StoreError),
}

/// Why a redeem attempt was refused.
#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    #[error("Redemption not found: {0}")]
    NotFound(Uuid),

    #[error("Redemption was already redeemed: {0}")]
    AlreadyRedeemed(Uuid),

    #[error("Redemption expired before it was redeemed: {0}")]
    RedemptionExpired(Uuid),

    #[error(transparent)]
    Store(StoreError),
}
