pub mod scheduler;

pub use scheduler::{BoostError, BoostPlan, BoostScheduler};
