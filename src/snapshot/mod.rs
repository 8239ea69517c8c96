//! Observation state, diffing, and persistence between runs.

pub mod diff;
pub mod state;
pub mod store;

pub use diff::{PriceChange, SectionDiff, SectionPrice};
pub use state::{ObservationMode, TargetState};
pub use store::SnapshotStore;
