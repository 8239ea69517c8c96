//! The check cycle: extract, classify, diff against the last snapshot, write back.

pub mod capture;
pub mod targets;

pub use capture::{capture_slug, CaptureDir, CaptureError, PageSource};
pub use targets::{load_targets, parse_targets, Target};

use crate::config::ExtractionConfig;
use crate::extract::{
    AvailabilityClassifier, AvailabilityReason, Disagreement, PageCapture, SectionPriceMap,
};
use crate::snapshot::{ObservationMode, SectionDiff, SnapshotStore, TargetState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How a target's availability moved between two runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityChange {
    /// `None` on the first observation
    pub previous: Option<bool>,
    pub current: bool,
    pub reason: AvailabilityReason,
}

impl AvailabilityChange {
    /// True if a prior observation exists and differs.
    pub fn changed(&self) -> bool {
        self.previous.is_some_and(|previous| previous != self.current)
    }
}

/// Everything a notifier needs about one target after a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub url: String,
    pub mode: ObservationMode,
    /// No prior snapshot existed for this target
    pub first_observation: bool,
    pub diff: SectionDiff,
    /// Only set in availability mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityChange>,
    /// Current sections and prices
    pub sections: SectionPriceMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disagreements: Vec<Disagreement>,
}

impl TargetReport {
    /// True if any section moved or availability flipped.
    pub fn has_changes(&self) -> bool {
        self.diff.has_changes() || self.availability.as_ref().is_some_and(AvailabilityChange::changed)
    }
}

/// A target that could not be checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFailure {
    pub url: String,
    pub error: String,
}

/// Result of checking a list of targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub reports: Vec<TargetReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TargetFailure>,
}

impl RunOutcome {
    /// Number of reports with changes.
    pub fn changed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.has_changes()).count()
    }
}

/// Runs extraction, classification, and diffing for each target.
#[derive(Debug, Clone, Default)]
pub struct Monitor {
    classifier: AvailabilityClassifier,
}

impl Monitor {
    /// Creates a monitor from extraction settings.
    pub fn new(config: &ExtractionConfig) -> Self {
        Self { classifier: AvailabilityClassifier::new(config) }
    }

    /// Observes one capture without touching any snapshot.
    ///
    /// Returns the new state, the availability reason in availability mode,
    /// and any pass disagreements.
    pub fn observe(
        &self,
        mode: ObservationMode,
        capture: &PageCapture,
    ) -> (TargetState, Option<AvailabilityReason>, Vec<Disagreement>) {
        let extraction = self.classifier.extractor().extract(capture);

        match mode {
            ObservationMode::Price => {
                (TargetState::priced(extraction.sections), None, extraction.disagreements)
            }
            ObservationMode::Availability => {
                let verdict = self.classifier.classify_extraction(capture, extraction.sections);
                let reason = verdict.reason;
                (TargetState::from_verdict(verdict), Some(reason), extraction.disagreements)
            }
        }
    }

    /// Checks one target against the store and records the new state.
    ///
    /// The prior entry is read before it is replaced.
    pub fn check(
        &self,
        target: &Target,
        capture: &PageCapture,
        store: &mut SnapshotStore,
    ) -> TargetReport {
        let (state, reason, disagreements) = self.observe(target.mode, capture);
        let previous = store.get(&target.url);

        let empty = SectionPriceMap::new();
        let diff = SectionDiff::between(previous.map_or(&empty, |p| &p.sections), &state.sections);

        let availability = reason.map(|reason| AvailabilityChange {
            previous: previous.map(|p| p.available),
            current: state.available,
            reason,
        });

        let report = TargetReport {
            url: target.url.clone(),
            mode: target.mode,
            first_observation: previous.is_none(),
            diff,
            availability,
            sections: state.sections.clone(),
            disagreements,
        };

        debug!(
            "{}: {} sections, {} changes{}",
            target.url,
            report.sections.len(),
            report.diff.change_count(),
            if report.first_observation { " (first observation)" } else { "" }
        );

        store.put(target.url.clone(), state);
        report
    }

    /// Checks every target in order.
    ///
    /// A target whose capture cannot be read is recorded as a failure and its
    /// snapshot is left as it was.
    pub fn run(
        &self,
        targets: &[Target],
        source: &impl PageSource,
        store: &mut SnapshotStore,
    ) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        for target in targets {
            let capture = match source.capture(&target.url) {
                Ok(capture) => capture,
                Err(e) => {
                    warn!("Skipping {}: {}", target.url, e);
                    outcome.failures.push(TargetFailure { url: target.url.clone(), error: e.to_string() });
                    continue;
                }
            };

            outcome.reports.push(self.check(target, &capture, store));
        }

        info!(
            "Checked {} targets: {} changed, {} failed",
            targets.len(),
            outcome.changed_count(),
            outcome.failures.len()
        );

        outcome
    }
}
