//! Canonical section names.

use super::patterns::INTRODUCER_PREFIX;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Case-normalized, whitespace-collapsed section key ("VIP 3", "PLATEA A").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionName(String);

impl SectionName {
    /// Canonicalizes a raw label.
    ///
    /// Strips a leading "Section"/"Sección"/"Sector" introducer, collapses
    /// whitespace runs, trims, and upper-cases. Returns `None` for blank input.
    pub fn canonicalize(raw: &str) -> Option<Self> {
        let mut label = raw.trim();

        // Repeat so that canonical names never start with an introducer
        while let Some(m) = INTRODUCER_PREFIX.find(label) {
            let rest = label[m.end()..].trim_start();
            if rest.is_empty() {
                break;
            }
            label = rest;
        }

        let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return None;
        }

        Some(Self(collapsed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the name.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SectionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
