//! ticket-watch - Ticket listing price and availability monitor
//!
//! Extracts per-section prices from captured listing pages, classifies
//! availability, and diffs each observation against the last snapshot.

pub mod commands;
pub mod config;
pub mod extract;
pub mod format;
pub mod monitor;
pub mod snapshot;

pub use config::Config;
pub use extract::{Extractor, PageCapture, Price, SectionName, SectionPriceMap};
pub use monitor::{Monitor, Target, TargetReport};
pub use snapshot::{ObservationMode, SectionDiff, SnapshotStore, TargetState};
