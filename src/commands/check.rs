//! Check command implementation.

use crate::config::Config;
use crate::format::ReportFormatter;
use crate::monitor::{load_targets, CaptureDir, Monitor, PageSource, Target};
use crate::snapshot::SnapshotStore;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Checks every target against the stored snapshot.
pub struct CheckCommand {
    config: Config,
    dry_run: bool,
}

impl CheckCommand {
    /// Creates a new check command.
    pub fn new(config: Config) -> Self {
        Self { config, dry_run: false }
    }

    /// Leave the snapshot file untouched.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs the check against the configured capture directory.
    pub fn execute(&self) -> Result<String> {
        let source = CaptureDir::new(&self.config.captures_dir);
        self.execute_with_source(&source)
    }

    /// Runs the check with a provided page source (for testing).
    pub fn execute_with_source(&self, source: &impl PageSource) -> Result<String> {
        let targets = self.targets()?;
        info!("Checking {} targets", targets.len());

        let mut store = SnapshotStore::load(&self.config.state_path)
            .context("Failed to load snapshot")?;

        let monitor = Monitor::new(&self.config.extraction);
        let outcome = monitor.run(&targets, source, &mut store);

        if self.dry_run {
            debug!("Dry run, not writing {}", self.config.state_path.display());
        } else {
            store.save(&self.config.state_path).context("Failed to save snapshot")?;
        }

        let formatter = ReportFormatter::new(self.config.format)
            .quiet_first_run(self.config.quiet_first_run);
        Ok(formatter.format_outcome(&outcome))
    }

    /// Inline targets from the config, then the targets file.
    ///
    /// A missing targets file is only an error when no inline targets exist.
    fn targets(&self) -> Result<Vec<Target>> {
        let mut targets = self.config.targets.clone();

        let path = &self.config.targets_path;
        if path.exists() || targets.is_empty() {
            targets.extend(load_targets(path)?);
        }

        let mut seen = std::collections::HashSet::new();
        targets.retain(|t| seen.insert(t.url.clone()));
        Ok(targets)
    }
}
