//! Data models for extraction input and output.

use super::money::Price;
use super::section::SectionName;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// Raw page content for one target, as handed over by the fetch side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCapture {
    /// Visible rendered text
    #[serde(default)]
    pub text: String,
    /// Raw page markup
    #[serde(default)]
    pub markup: String,
}

impl PageCapture {
    /// Creates a capture from text and markup.
    pub fn new(text: impl Into<String>, markup: impl Into<String>) -> Self {
        Self { text: text.into(), markup: markup.into() }
    }

    /// Creates a capture with visible text only.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), markup: String::new() }
    }

    /// Returns true if both text and markup are blank.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.markup.trim().is_empty()
    }
}

/// One raw input to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    /// Visible text, scanned line by line
    Text(&'a str),
    /// Raw markup, scanned by the fallback pass
    Markup(&'a str),
}

/// Section to lowest price mapping.
///
/// Every insert keeps the smaller of the existing and offered prices, so the
/// result does not depend on the order observations arrive in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionPriceMap(BTreeMap<SectionName, Price>);

impl SectionPriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a price, keeping the minimum. Returns true if the map changed.
    pub fn insert_min(&mut self, section: SectionName, price: Price) -> bool {
        match self.0.entry(section) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(price);
                true
            }
            btree_map::Entry::Occupied(mut slot) => {
                if price < *slot.get() {
                    slot.insert(price);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Merges another map into this one (min by key).
    pub fn merge(mut self, other: SectionPriceMap) -> Self {
        self.extend(other);
        self
    }

    pub fn get(&self, section: &str) -> Option<Price> {
        self.0.get(section).copied()
    }

    pub fn contains(&self, section: &str) -> bool {
        self.0.contains_key(section)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates sections in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&SectionName, Price)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &SectionName> {
        self.0.keys()
    }

    /// Lowest price across all sections.
    pub fn cheapest(&self) -> Option<(&SectionName, Price)> {
        self.iter().min_by_key(|(_, price)| *price)
    }
}

impl FromIterator<(SectionName, Price)> for SectionPriceMap {
    fn from_iter<I: IntoIterator<Item = (SectionName, Price)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl Extend<(SectionName, Price)> for SectionPriceMap {
    fn extend<I: IntoIterator<Item = (SectionName, Price)>>(&mut self, iter: I) {
        for (section, price) in iter {
            self.insert_min(section, price);
        }
    }
}

impl IntoIterator for SectionPriceMap {
    type Item = (SectionName, Price);
    type IntoIter = btree_map::IntoIter<SectionName, Price>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Extraction heuristic that produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    /// "Section X" line followed by a price
    Explicit,
    /// Known section-name prefix, price on the line or just after
    Implicit,
    /// Section text node in raw markup
    Markup,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Explicit => write!(f, "explicit"),
            Pass::Implicit => write!(f, "implicit"),
            Pass::Markup => write!(f, "markup"),
        }
    }
}

/// Two or more passes priced the same section differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disagreement {
    pub section: SectionName,
    /// Lowest price per pass, ordered by pass
    pub prices: Vec<(Pass, Price)>,
}

impl Disagreement {
    /// Difference between the highest and lowest price seen.
    pub fn spread(&self) -> Price {
        let min = self.prices.iter().map(|(_, p)| *p).min();
        let max = self.prices.iter().map(|(_, p)| *p).max();
        match (min, max) {
            (Some(min), Some(max)) => max.abs_diff(min),
            _ => Price::from_cents(0),
        }
    }
}

/// Result of running the extractor over one target's sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Merged section prices
    pub sections: SectionPriceMap,
    /// Sections where passes disagreed beyond the tolerance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disagreements: Vec<Disagreement>,
}
