use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

/// Session-scoped impression dedup set.
///
/// One instance per viewing session, injected into the recorder so state
/// never leaks across sessions or tests. A revisit in a new session builds
/// a fresh set and legitimately counts again.
#[derive(Debug, Default)]
pub struct SessionDedup {
    seen: Mutex<HashSet<(Uuid, String)>>,
}

impl SessionDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time an (offer, viewer) pair is seen in this
    /// session, false on every subsequent sighting.
    pub fn first_sighting(&self, offer_id: Uuid, viewer_key: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.insert((offer_id, viewer_key.to_string()))
    }

    /// Drop all recorded sightings, starting the session over.
    pub fn reset(&self) {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.clear();
    }
}
