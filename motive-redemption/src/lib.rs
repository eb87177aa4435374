pub mod codes;
pub mod error;
pub mod manager;
pub mod models;
pub mod repository;

pub use codes::{CodeDirectory, CodeGenerator};
pub use error::{ClaimError, RedeemError};
pub use manager::{ExpiryPolicy, RedemptionManager, RedemptionPolicy};
pub use models::{Redemption, RedemptionStatus};
pub use repository::RedemptionRepository;
