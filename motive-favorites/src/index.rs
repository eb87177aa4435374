use crate::repository::FavoriteRepository;
use motive_shared::{EntityKind, StoreError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Per-user favorite overlay, independent of offer state.
pub struct FavoritesIndex {
    repo: Arc<dyn FavoriteRepository>,
}

impl FavoritesIndex {
    pub fn new(repo: Arc<dyn FavoriteRepository>) -> Self {
        Self { repo }
    }

    /// Open a session-scoped view. Each logical UI session gets its own,
    /// so hydration guards never leak across sessions or tests.
    pub fn session(&self) -> FavoritesSession {
        FavoritesSession {
            repo: self.repo.clone(),
            state: Mutex::new(SessionState::Idle),
            closed: AtomicBool::new(false),
        }
    }

    /// Atomic flip of edge existence; true means now favorited. Failures
    /// surface to the caller so it can revert optimistic UI state.
    pub async fn toggle(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: Uuid,
    ) -> Result<bool, FavoriteError> {
        self.repo
            .toggle(user_id, kind, entity_id)
            .await
            .map_err(FavoriteError::Store)
    }
}

enum SessionState {
    Idle,
    InFlight,
    Hydrated(HashMap<Uuid, bool>),
}

/// What a hydrate call did.
#[derive(Debug, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// The batch lookup ran and the session is now hydrated.
    Hydrated,
    /// Another hydration is already in flight; nothing was fetched.
    InFlight,
    /// The session was hydrated earlier; nothing was fetched.
    AlreadyHydrated,
    /// The session was closed; any fetched result was discarded.
    Closed,
}

/// One session's favorite state, hydrated at most once.
///
/// `hydrate` issues exactly one batched lookup for the whole id set. It
/// refuses to re-fire while a lookup is in flight or once hydrated, and a
/// closed (torn down) session never applies a late result - the fix for
/// the per-entity lookup storm that caused visible flicker upstream.
pub struct FavoritesSession {
    repo: Arc<dyn FavoriteRepository>,
    state: Mutex<SessionState>,
    closed: AtomicBool,
}

impl FavoritesSession {
    /// Batch-load favorite state for the session's visible entities.
    pub async fn hydrate(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_ids: &[Uuid],
    ) -> Result<HydrationOutcome, FavoriteError> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(HydrationOutcome::Closed);
        }

        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match *state {
                SessionState::Idle => *state = SessionState::InFlight,
                SessionState::InFlight => return Ok(HydrationOutcome::InFlight),
                SessionState::Hydrated(_) => return Ok(HydrationOutcome::AlreadyHydrated),
            }
        }

        // Single batched call; the guard above makes sure it cannot fan
        // out into one lookup per entity or per render.
        let result = self.repo.favorites_for(user_id, kind, entity_ids).await;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match result {
            Ok(map) => {
                if self.closed.load(Ordering::SeqCst) {
                    // Torn down while the batch was running: drop the
                    // stale result instead of applying it.
                    *state = SessionState::Idle;
                    return Ok(HydrationOutcome::Closed);
                }
                *state = SessionState::Hydrated(map);
                Ok(HydrationOutcome::Hydrated)
            }
            Err(err) => {
                *state = SessionState::Idle;
                Err(FavoriteError::Store(err))
            }
        }
    }

    /// Hydrated favorite state for one entity; None before hydration.
    pub fn is_favorited(&self, entity_id: Uuid) -> Option<bool> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match &*state {
            SessionState::Hydrated(map) => Some(map.get(&entity_id).copied().unwrap_or(false)),
            _ => None,
        }
    }

    /// Ids currently favorited, for building catalog viewer context.
    pub fn saved_ids(&self) -> HashSet<Uuid> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match &*state {
            SessionState::Hydrated(map) => map
                .iter()
                .filter(|(_, favorited)| **favorited)
                .map(|(id, _)| *id)
                .collect(),
            _ => HashSet::new(),
        }
    }

    /// Toggle through the session, keeping its hydrated overlay in sync.
    pub async fn toggle(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: Uuid,
    ) -> Result<bool, FavoriteError> {
        let favorited = self
            .repo
            .toggle(user_id, kind, entity_id)
            .await
            .map_err(FavoriteError::Store)?;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let SessionState::Hydrated(map) = &mut *state {
            map.insert(entity_id, favorited);
        }
        Ok(favorited)
    }

    /// Tear the session down. Any in-flight hydration result is discarded.
    pub fn close(&self) {
        // Set under the state lock; a finished batch re-checks `closed`
        // under the same lock before applying its result, so a close can
        // never land between that check and the state write.
        let _state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FavoriteError {
    #[error(transparent)]
    Store(StoreError),
}
