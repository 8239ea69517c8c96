//! Snapshot command implementation.

use crate::config::Config;
use crate::format::ReportFormatter;
use crate::snapshot::SnapshotStore;
use anyhow::Result;

/// Prints the stored snapshot.
pub struct SnapshotCommand {
    config: Config,
}

impl SnapshotCommand {
    /// Creates a new snapshot command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads the snapshot file and formats it, optionally for one target only.
    pub fn execute(&self, url: Option<&str>) -> Result<String> {
        let store = SnapshotStore::load(&self.config.state_path)?;

        let store = match url {
            Some(url) => {
                let mut only = SnapshotStore::new();
                if let Some(state) = store.get(url) {
                    only.put(url, state.clone());
                }
                only
            }
            None => store,
        };

        Ok(ReportFormatter::new(self.config.format).format_store(&store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Price, SectionName, SectionPriceMap};
    use crate::snapshot::TargetState;
    use tempfile::TempDir;

    fn store_with_two(dir: &TempDir) -> Config {
        let path = dir.path().join("prices.json");
        let mut store = SnapshotStore::new();
        let sections: SectionPriceMap = [(
            SectionName::canonicalize("vip").unwrap(),
            "99".parse::<Price>().unwrap(),
        )]
        .into_iter()
        .collect();
        store.put("https://t.example/1", TargetState::priced(sections));
        store.put("https://t.example/2", TargetState::priced(SectionPriceMap::new()));
        store.save(&path).unwrap();

        Config { state_path: path, ..Default::default() }
    }

    #[test]
    fn test_snapshot_all() {
        let dir = TempDir::new().unwrap();
        let output = SnapshotCommand::new(store_with_two(&dir)).execute(None).unwrap();
        assert!(output.contains("https://t.example/1\nMode: price, available\n- VIP: 99.00"));
        assert!(output.contains("https://t.example/2\nMode: price, unavailable\nNo prices detected"));
    }

    #[test]
    fn test_snapshot_single_target() {
        let dir = TempDir::new().unwrap();
        let cmd = SnapshotCommand::new(store_with_two(&dir));

        let output = cmd.execute(Some("https://t.example/2")).unwrap();
        assert!(!output.contains("t.example/1"));

        let output = cmd.execute(Some("https://t.example/9")).unwrap();
        assert_eq!(output, "No snapshot recorded.");
    }

    #[test]
    fn test_snapshot_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config { state_path: dir.path().join("none.json"), ..Default::default() };
        let output = SnapshotCommand::new(config).execute(None).unwrap();
        assert_eq!(output, "No snapshot recorded.");
    }
}
