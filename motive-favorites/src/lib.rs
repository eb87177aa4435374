pub mod index;
pub mod repository;

pub use index::{FavoriteError, FavoritesIndex, FavoritesSession, HydrationOutcome};
pub use repository::FavoriteRepository;
