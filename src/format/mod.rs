//! Output formatting for check reports (text, markdown, JSON).

use crate::config::OutputFormat;
use crate::extract::{AvailabilityVerdict, Extraction, SectionPriceMap};
use crate::monitor::{AvailabilityChange, RunOutcome, TargetFailure, TargetReport};
use crate::snapshot::{SectionDiff, SnapshotStore};
use serde_json::json;

/// Formats reports for output.
pub struct ReportFormatter {
    format: OutputFormat,
    quiet_first_run: bool,
}

impl ReportFormatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format, quiet_first_run: false }
    }

    /// On a first observation, list current prices instead of "new" entries.
    pub fn quiet_first_run(mut self, quiet: bool) -> Self {
        self.quiet_first_run = quiet;
        self
    }

    /// Formats the result of a whole run.
    pub fn format_outcome(&self, outcome: &RunOutcome) -> String {
        if let OutputFormat::Json = self.format {
            return serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string());
        }

        if outcome.reports.is_empty() && outcome.failures.is_empty() {
            return "No targets checked.".to_string();
        }

        let mut blocks: Vec<String> = outcome.reports.iter().map(|r| self.format_report(r)).collect();
        if !outcome.failures.is_empty() {
            blocks.push(self.failures_block(&outcome.failures));
        }
        blocks.join("\n\n")
    }

    /// Formats a single target report.
    pub fn format_report(&self, report: &TargetReport) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Text => self.text_report(report),
            OutputFormat::Markdown => self.markdown_report(report),
        }
    }

    /// Formats a one-off extraction, with the verdict when classified.
    pub fn format_extraction(
        &self,
        extraction: &Extraction,
        verdict: Option<&AvailabilityVerdict>,
    ) -> String {
        match self.format {
            OutputFormat::Json => {
                let value = json!({
                    "sections": extraction.sections,
                    "disagreements": extraction.disagreements,
                    "availability": verdict.map(|v| json!({"available": v.available, "reason": v.reason})),
                });
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Text | OutputFormat::Markdown => {
                let style = self.style();
                let mut lines = vec![style.heading("Sections")];
                lines.extend(style.price_list(&extraction.sections));

                if !extraction.disagreements.is_empty() {
                    lines.push(String::new());
                    lines.push(style.heading("Disagreements"));
                    for d in &extraction.disagreements {
                        let prices: Vec<String> =
                            d.prices.iter().map(|(pass, price)| format!("{} {}", pass, price)).collect();
                        lines.push(format!("{}{}: {}", style.bullet, style.name(d.section.as_str()), prices.join(", ")));
                    }
                }

                if let Some(v) = verdict {
                    lines.push(String::new());
                    lines.push(format!(
                        "Availability: {} ({})",
                        availability_word(v.available),
                        v.reason
                    ));
                }

                lines.join("\n")
            }
        }
    }

    /// Formats the stored snapshot.
    pub fn format_store(&self, store: &SnapshotStore) -> String {
        if let OutputFormat::Json = self.format {
            return serde_json::to_string_pretty(store).unwrap_or_else(|_| "{}".to_string());
        }
        if store.is_empty() {
            return "No snapshot recorded.".to_string();
        }

        let style = self.style();
        store
            .iter()
            .map(|(url, state)| {
                let mut lines = vec![
                    style.heading(url),
                    format!("Mode: {}, {}", state.mode, availability_word(state.available)),
                ];
                lines.extend(style.price_list(&state.sections));
                lines.join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn style(&self) -> Style {
        match self.format {
            OutputFormat::Markdown => Style::MARKDOWN,
            _ => Style::TEXT,
        }
    }

    fn text_report(&self, report: &TargetReport) -> String {
        self.render_report(report, Style::TEXT)
    }

    fn markdown_report(&self, report: &TargetReport) -> String {
        self.render_report(report, Style::MARKDOWN)
    }

    fn render_report(&self, report: &TargetReport, style: Style) -> String {
        let quiet_first = report.first_observation && self.quiet_first_run;
        let changed = report.has_changes() || report.first_observation;

        let title = if quiet_first {
            "First observation"
        } else if changed {
            "Changes detected"
        } else {
            "No changes"
        };

        let mut lines = vec![style.heading(title), report.url.clone()];

        if let Some(change) = &report.availability {
            lines.push(availability_line(change));
        }

        let blocks = diff_blocks(&report.diff, &style);
        if quiet_first || !changed {
            lines.extend(style.price_list(&report.sections));
        } else if !blocks.is_empty() {
            lines.push(blocks.join("\n\n"));
        } else if report.first_observation {
            lines.push("First observation recorded. (No previous snapshot)".to_string());
        } else {
            lines.extend(style.price_list(&report.sections));
        }

        lines.join("\n")
    }

    fn failures_block(&self, failures: &[TargetFailure]) -> String {
        let style = self.style();
        let mut lines = vec![style.heading("Failed")];
        for failure in failures {
            lines.push(format!("{}{}: {}", style.bullet, failure.url, failure.error));
        }
        lines.join("\n")
    }
}

/// Line prefixes and name decoration for a text-like format.
#[derive(Clone, Copy)]
struct Style {
    heading_prefix: &'static str,
    bullet: &'static str,
    quote: &'static str,
}

impl Style {
    const TEXT: Style = Style { heading_prefix: "", bullet: "- ", quote: "" };
    const MARKDOWN: Style = Style { heading_prefix: "### ", bullet: "- ", quote: "`" };

    fn heading(&self, title: &str) -> String {
        format!("{}{}", self.heading_prefix, title)
    }

    fn name(&self, section: &str) -> String {
        format!("{}{}{}", self.quote, section, self.quote)
    }

    fn price_list(&self, sections: &SectionPriceMap) -> Vec<String> {
        if sections.is_empty() {
            return vec!["No prices detected".to_string()];
        }
        sections
            .iter()
            .map(|(section, price)| format!("{}{}: {}", self.bullet, self.name(section.as_str()), price))
            .collect()
    }
}

fn diff_blocks(diff: &SectionDiff, style: &Style) -> Vec<String> {
    let mut blocks = Vec::new();

    if !diff.increased.is_empty() {
        let mut lines = vec!["Increased:".to_string()];
        for c in &diff.increased {
            lines.push(format!(
                "{}{}: {} -> {} (+{})",
                style.bullet,
                style.name(c.section.as_str()),
                c.old,
                c.new,
                c.delta
            ));
        }
        blocks.push(lines.join("\n"));
    }

    if !diff.decreased.is_empty() {
        let mut lines = vec!["Decreased:".to_string()];
        for c in &diff.decreased {
            lines.push(format!(
                "{}{}: {} -> {} (-{})",
                style.bullet,
                style.name(c.section.as_str()),
                c.old,
                c.new,
                c.delta
            ));
        }
        blocks.push(lines.join("\n"));
    }

    if !diff.appeared.is_empty() {
        let mut lines = vec!["New:".to_string()];
        for s in &diff.appeared {
            lines.push(format!("{}{}: {}", style.bullet, style.name(s.section.as_str()), s.price));
        }
        blocks.push(lines.join("\n"));
    }

    if !diff.disappeared.is_empty() {
        let mut lines = vec!["Gone:".to_string()];
        for s in &diff.disappeared {
            lines.push(format!("{}{} (was {})", style.bullet, style.name(s.section.as_str()), s.price));
        }
        blocks.push(lines.join("\n"));
    }

    blocks
}

fn availability_word(available: bool) -> &'static str {
    if available {
        "available"
    } else {
        "unavailable"
    }
}

fn availability_line(change: &AvailabilityChange) -> String {
    match change.previous {
        Some(previous) if previous != change.current => format!(
            "Availability: {} -> {} ({})",
            availability_word(previous),
            availability_word(change.current),
            change.reason
        ),
        _ => format!("Availability: {} ({})", availability_word(change.current), change.reason),
    }
}
