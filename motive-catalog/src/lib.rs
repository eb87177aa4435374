pub mod offer;
pub mod repository;
pub mod views;

pub use offer::{BoostState, Offer, OfferDraft, OfferValidationError};
pub use repository::OfferRepository;
pub use views::{OfferCatalog, OfferFilter, OfferView, SortKey, Tab, ViewerContext};
