//! Extract command implementation.

use crate::config::Config;
use crate::extract::{AvailabilityClassifier, PageCapture};
use crate::format::ReportFormatter;
use crate::snapshot::ObservationMode;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Runs extraction over local files without touching any snapshot.
pub struct ExtractCommand {
    config: Config,
}

impl ExtractCommand {
    /// Creates a new extract command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Reads the given text and markup files and extracts from them.
    pub fn execute(
        &self,
        text_path: Option<&Path>,
        markup_path: Option<&Path>,
        mode: ObservationMode,
    ) -> Result<String> {
        if text_path.is_none() && markup_path.is_none() {
            anyhow::bail!("Nothing to extract from. Pass --text and/or --markup.");
        }

        let capture = PageCapture::new(read_file(text_path)?, read_file(markup_path)?);
        Ok(self.execute_capture(&capture, mode))
    }

    /// Extracts from an in-memory capture.
    pub fn execute_capture(&self, capture: &PageCapture, mode: ObservationMode) -> String {
        let classifier = AvailabilityClassifier::new(&self.config.extraction);
        let extraction = classifier.extractor().extract(capture);
        info!("Extracted {} sections", extraction.sections.len());

        let verdict = match mode {
            ObservationMode::Price => None,
            ObservationMode::Availability => {
                Some(classifier.classify_extraction(capture, extraction.sections.clone()))
            }
        };

        ReportFormatter::new(self.config.format).format_extraction(&extraction, verdict.as_ref())
    }
}

fn read_file(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => Ok(String::new()),
    }
}
