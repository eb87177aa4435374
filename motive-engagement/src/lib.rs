pub mod counters;
pub mod dedup;
pub mod recorder;

pub use counters::{CounterSnapshot, CounterStore, OfferStats, PriceSource};
pub use dedup::SessionDedup;
pub use recorder::EngagementRecorder;
