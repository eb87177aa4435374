use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Interaction signal types feeding the aggregate counters.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Impression,
    Click,
    View,
    Share,
    Claim,
}

/// A single engagement signal reported by the display layer.
///
/// Events are consumed into per-offer counters and not retained
/// individually.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngagementEvent {
    pub offer_id: Uuid,
    /// Opaque session or user identifier; the engine never interprets it.
    pub viewer_key: String,
    pub kind: EventKind,
    /// Free-form provenance tag ("offers_page", "carousel", ...).
    pub source: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl EngagementEvent {
    pub fn new(offer_id: Uuid, viewer_key: impl Into<String>, kind: EventKind) -> Self {
        Self {
            offer_id,
            viewer_key: viewer_key.into(),
            kind,
            source: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
