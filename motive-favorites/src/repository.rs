use async_trait::async_trait;
use motive_shared::{EntityKind, StoreError};
use std::collections::HashMap;
use uuid::Uuid;

/// Repository trait for favorite edges.
///
/// The batch lookup is deliberately the only read: per-entity sequential
/// lookups are the anti-pattern this interface exists to rule out.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// One batched existence check for the whole id set.
    async fn favorites_for(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, bool>, StoreError>;

    /// Atomically flip edge existence; returns the new favorited state.
    async fn toggle(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: Uuid,
    ) -> Result<bool, StoreError>;
}
