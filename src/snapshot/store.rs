//! Snapshot store carried between runs.

use super::state::TargetState;
use crate::extract::SectionPriceMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Last known state per target, keyed by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SnapshotStore {
    targets: BTreeMap<String, TargetState>,
}

/// A stored entry in either the current or the older bare-map layout.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTarget {
    State(TargetState),
    Legacy(SectionPriceMap),
}

impl From<StoredTarget> for TargetState {
    fn from(stored: StoredTarget) -> Self {
        match stored {
            StoredTarget::State(state) => state,
            StoredTarget::Legacy(sections) => TargetState::priced(sections),
        }
    }
}

impl<'de> Deserialize<'de> for SnapshotStore {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, StoredTarget>::deserialize(deserializer)?;
        let targets = raw.into_iter().map(|(url, stored)| (url, stored.into())).collect();
        Ok(Self { targets })
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known state for a target.
    pub fn get(&self, target: &str) -> Option<&TargetState> {
        self.targets.get(target)
    }

    /// Replaces a target's state, returning what was there before.
    pub fn put(&mut self, target: impl Into<String>, state: TargetState) -> Option<TargetState> {
        self.targets.insert(target.into(), state)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Iterates targets in URL order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetState)> {
        self.targets.iter().map(|(url, state)| (url.as_str(), state))
    }

    /// Loads a store from a JSON file. A missing file gives an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let store: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?;
        debug!("Loaded {} targets from {}", store.len(), path.display());
        Ok(store)
    }

    /// Writes the store as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot file: {}", path.display()))?;
        info!("Saved {} targets to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Price, SectionName};
    use crate::snapshot::ObservationMode;
    use tempfile::TempDir;

    fn sections(entries: &[(&str, &str)]) -> SectionPriceMap {
        entries
            .iter()
            .map(|(k, v)| (SectionName::canonicalize(k).unwrap(), v.parse::<Price>().unwrap()))
            .collect()
    }

    #[test]
    fn test_put_returns_previous() {
        let mut store = SnapshotStore::new();
        let first = TargetState::priced(sections(&[("A", "100")]));
        let second = TargetState::priced(sections(&[("A", "120")]));

        assert!(store.put("https://t.example/1", first.clone()).is_none());
        assert_eq!(store.put("https://t.example/1", second.clone()), Some(first));
        assert_eq!(store.get("https://t.example/1"), Some(&second));
        assert!(store.get("https://t.example/2").is_none());
    }

    #[test]
    fn test_put_replaces_wholesale() {
        let mut store = SnapshotStore::new();
        store.put("u", TargetState::priced(sections(&[("A", "1"), ("B", "2")])));
        store.put("u", TargetState::priced(sections(&[("C", "3")])));

        let state = store.get("u").unwrap();
        assert_eq!(state.sections.len(), 1);
        assert!(state.sections.contains("C"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::load(dir.path().join("prices.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("prices.json");

        let mut store = SnapshotStore::new();
        store.put("https://t.example/a", TargetState::priced(sections(&[("VIP", "1250.50")])));
        store.put(
            "https://t.example/b",
            TargetState {
                mode: ObservationMode::Availability,
                sections: SectionPriceMap::new(),
                available: false,
            },
        );
        store.save(&path).unwrap();

        let loaded = SnapshotStore::load(&path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_legacy_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.json");
        std::fs::write(
            &path,
            r#"{"https://t.example/a": {"VIP": 1250.0, "PLATEA A": 900}, "https://t.example/b": {}}"#,
        )
        .unwrap();

        let store = SnapshotStore::load(&path).unwrap();
        let a = store.get("https://t.example/a").unwrap();
        assert_eq!(a.mode, ObservationMode::Price);
        assert!(a.available);
        assert_eq!(a.sections.get("VIP"), Some("1250".parse().unwrap()));
        assert_eq!(a.sections.get("PLATEA A"), Some("900".parse().unwrap()));

        let b = store.get("https://t.example/b").unwrap();
        assert!(!b.available);
        assert!(b.sections.is_empty());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.json");
        std::fs::write(&path, "not json").unwrap();

        let err = SnapshotStore::load(&path).unwrap_err().to_string();
        assert!(err.contains("Failed to parse snapshot file"));
    }
}
