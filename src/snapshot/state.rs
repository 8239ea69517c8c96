//! Per-target observation state.

use crate::extract::{AvailabilityVerdict, SectionPriceMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a target is watched for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationMode {
    /// Per-section price changes
    #[default]
    Price,
    /// Whether anything is on sale at all
    Availability,
}

impl FromStr for ObservationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" | "prices" => Ok(ObservationMode::Price),
            "availability" | "avail" => Ok(ObservationMode::Availability),
            _ => Err(format!("Unknown mode: {}. Use: price, availability", s)),
        }
    }
}

impl fmt::Display for ObservationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationMode::Price => write!(f, "price"),
            ObservationMode::Availability => write!(f, "availability"),
        }
    }
}

/// Last known state of one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetState {
    #[serde(default)]
    pub mode: ObservationMode,
    #[serde(default)]
    pub sections: SectionPriceMap,
    #[serde(default)]
    pub available: bool,
}

impl TargetState {
    /// State for a price-mode observation.
    pub fn priced(sections: SectionPriceMap) -> Self {
        let available = !sections.is_empty();
        Self { mode: ObservationMode::Price, sections, available }
    }

    /// State for an availability-mode observation.
    pub fn from_verdict(verdict: AvailabilityVerdict) -> Self {
        Self {
            mode: ObservationMode::Availability,
            sections: verdict.sections,
            available: verdict.available,
        }
    }
}
