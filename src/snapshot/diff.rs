//! Section-level comparison of two observations.

use crate::extract::{Price, SectionName, SectionPriceMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A section whose price moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub section: SectionName,
    pub old: Price,
    pub new: Price,
    /// Absolute size of the move
    pub delta: Price,
}

/// A section and a single price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPrice {
    pub section: SectionName,
    pub price: Price,
}

/// Classified differences between two section maps.
///
/// Every section in either map lands in exactly one of the five lists, each
/// sorted by section name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDiff {
    pub increased: Vec<PriceChange>,
    pub decreased: Vec<PriceChange>,
    /// Sections only in the new map, with their new price
    pub appeared: Vec<SectionPrice>,
    /// Sections only in the old map, with their last price
    pub disappeared: Vec<SectionPrice>,
    pub unchanged: Vec<SectionName>,
}

impl SectionDiff {
    /// Compares `old` to `new`.
    pub fn between(old: &SectionPriceMap, new: &SectionPriceMap) -> Self {
        let mut diff = Self::default();
        let keys: BTreeSet<&SectionName> = old.keys().chain(new.keys()).collect();

        for section in keys {
            match (old.get(section.as_str()), new.get(section.as_str())) {
                (None, Some(price)) => {
                    diff.appeared.push(SectionPrice { section: section.clone(), price })
                }
                (Some(price), None) => {
                    diff.disappeared.push(SectionPrice { section: section.clone(), price })
                }
                (Some(old), Some(new)) if new > old => diff.increased.push(PriceChange {
                    section: section.clone(),
                    old,
                    new,
                    delta: new.abs_diff(old),
                }),
                (Some(old), Some(new)) if new < old => diff.decreased.push(PriceChange {
                    section: section.clone(),
                    old,
                    new,
                    delta: old.abs_diff(new),
                }),
                (Some(_), Some(_)) => diff.unchanged.push(section.clone()),
                (None, None) => {}
            }
        }

        diff
    }

    /// Returns true if anything increased, decreased, appeared, or disappeared.
    pub fn has_changes(&self) -> bool {
        !(self.increased.is_empty()
            && self.decreased.is_empty()
            && self.appeared.is_empty()
            && self.disappeared.is_empty())
    }

    /// Number of changed sections.
    pub fn change_count(&self) -> usize {
        self.increased.len() + self.decreased.len() + self.appeared.len() + self.disappeared.len()
    }
}
