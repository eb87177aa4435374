pub mod events;

use serde::{Deserialize, Serialize};

/// Kinds of entities a user can favorite.
///
/// Offers are the only kind the engine mutates, but the favorites edge is
/// shared with other parts of the platform, so the discriminant is open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Offer,
    Listing,
    Garage,
}
