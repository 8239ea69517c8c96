//! CLI command implementations.

pub mod check;
pub mod extract;
pub mod snapshot;

pub use check::CheckCommand;
pub use extract::ExtractCommand;
pub use snapshot::SnapshotCommand;
