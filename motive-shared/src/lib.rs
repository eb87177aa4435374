pub mod models;

pub use models::events::{EngagementEvent, EventKind};
pub use models::EntityKind;

/// Error surface shared by every repository trait in the workspace.
///
/// Domain crates wrap this into their own error enums; callers should
/// never have to match on backend-specific failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
