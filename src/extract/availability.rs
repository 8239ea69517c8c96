//! Availability classification for listings watched in availability mode.

use super::markup::visible_text;
use super::models::{PageCapture, SectionPriceMap};
use super::money::contains_money;
use super::parser::Extractor;
use super::patterns::UNAVAILABLE_PHRASES;
use crate::config::ExtractionConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The rule that decided a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityReason {
    /// A sold-out notice and no priced sections
    SoldOutNotice,
    /// At least one priced section
    SectionsListed,
    /// A price somewhere on the page, not tied to a section
    PriceMentioned,
    /// Nothing either way
    NoSignal,
}

impl fmt::Display for AvailabilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityReason::SoldOutNotice => write!(f, "sold-out notice"),
            AvailabilityReason::SectionsListed => write!(f, "sections listed"),
            AvailabilityReason::PriceMentioned => write!(f, "price mentioned"),
            AvailabilityReason::NoSignal => write!(f, "no signal"),
        }
    }
}

/// Outcome of classifying one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityVerdict {
    pub available: bool,
    pub reason: AvailabilityReason,
    /// Whatever sections the extractor found along the way
    pub sections: SectionPriceMap,
}

/// Decides whether a listing has anything on sale.
#[derive(Debug, Clone)]
pub struct AvailabilityClassifier {
    extractor: Extractor,
    phrases: Vec<String>,
    visible_text_only: bool,
}

impl Default for AvailabilityClassifier {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl AvailabilityClassifier {
    /// Creates a classifier from configuration.
    pub fn new(config: &ExtractionConfig) -> Self {
        Self::with_extractor(Extractor::new(config), &config.extra_unavailable_phrases)
            .visible_text_only(config.visible_text_only)
    }

    /// Creates a classifier around an existing extractor.
    pub fn with_extractor(extractor: Extractor, extra_phrases: &[String]) -> Self {
        let mut phrases: Vec<String> = UNAVAILABLE_PHRASES.iter().map(|p| p.to_string()).collect();
        phrases.extend(
            extra_phrases.iter().map(|p| p.trim().to_lowercase()).filter(|p| !p.is_empty()),
        );
        Self { extractor, phrases, visible_text_only: false }
    }

    /// Ignores raw markup when looking for phrases and bare prices.
    pub fn visible_text_only(mut self, enabled: bool) -> Self {
        self.visible_text_only = enabled;
        self
    }

    /// The extractor used to find sections.
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Classifies a page.
    ///
    /// Rules, first match wins:
    /// 1. sold-out phrase and no sections: unavailable
    /// 2. any section: available, even next to a sold-out phrase
    /// 3. any bare price: available
    /// 4. otherwise unavailable
    ///
    /// Phrases and bare prices count anywhere in the capture, including
    /// script payloads in the raw markup, unless `visible_text_only` is set.
    pub fn classify(&self, capture: &PageCapture) -> AvailabilityVerdict {
        self.classify_extraction(capture, self.extractor.extract(capture).sections)
    }

    /// Classifies a page whose sections were already extracted.
    pub fn classify_extraction(
        &self,
        capture: &PageCapture,
        sections: SectionPriceMap,
    ) -> AvailabilityVerdict {
        let rendered = visible_text(&capture.markup);
        let mut evidence = vec![capture.text.as_str(), rendered.as_str()];
        if !self.visible_text_only {
            evidence.push(capture.markup.as_str());
        }

        let sold_out = evidence.iter().any(|text| self.has_sold_out_phrase(text));

        let (available, reason) = if sold_out && sections.is_empty() {
            (false, AvailabilityReason::SoldOutNotice)
        } else if !sections.is_empty() {
            (true, AvailabilityReason::SectionsListed)
        } else if evidence.iter().any(|text| contains_money(text)) {
            (true, AvailabilityReason::PriceMentioned)
        } else {
            (false, AvailabilityReason::NoSignal)
        };

        debug!(
            "Availability: {} ({}, {} sections, sold-out phrase: {})",
            available,
            reason,
            sections.len(),
            sold_out
        );

        AvailabilityVerdict { available, reason, sections }
    }

    /// Returns true if the text carries any sold-out phrase.
    pub fn has_sold_out_phrase(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.phrases.iter().any(|p| lower.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str, markup: &str) -> AvailabilityVerdict {
        AvailabilityClassifier::default().classify(&PageCapture::new(text, markup))
    }

    #[test]
    fn test_sold_out_without_sections() {
        let verdict = classify("Concierto\nSold out\nFollow us", "");
        assert!(!verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::SoldOutNotice);
        assert!(verdict.sections.is_empty());
    }

    #[test]
    fn test_sections_override_sold_out_banner() {
        let verdict = classify("AGOTADO en preventa\nSection VIP\n$1,250.00", "");
        assert!(verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::SectionsListed);
        assert_eq!(verdict.sections.len(), 1);
    }

    #[test]
    fn test_bare_price_means_available() {
        let verdict = classify("Tickets from $45", "");
        assert!(verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::PriceMentioned);
        assert!(verdict.sections.is_empty());
    }

    #[test]
    fn test_no_signal() {
        let verdict = classify("Doors open at 8pm", "<p>See you there</p>");
        assert!(!verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::NoSignal);
    }

    #[test]
    fn test_sold_out_phrase_in_markup() {
        let verdict = classify("", r#"<div class="banner">Boletos agotados</div>"#);
        assert!(!verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::SoldOutNotice);
    }

    #[test]
    fn test_price_in_embedded_json_means_available() {
        let markup = r#"<div id=app></div><script>window.__DATA__={"min":"MX$1,200.00"}</script>"#;
        let verdict = classify("", markup);
        assert!(verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::PriceMentioned);
    }

    #[test]
    fn test_sold_out_phrase_in_script_counts() {
        let markup = r#"<script>const tpl = "$1"; const msg = "sold out";</script><p>Coming soon</p>"#;
        let verdict = classify("", markup);
        assert!(!verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::SoldOutNotice);
    }

    #[test]
    fn test_visible_text_only_ignores_script() {
        let config = ExtractionConfig { visible_text_only: true, ..Default::default() };
        let classifier = AvailabilityClassifier::new(&config);

        let markup = r#"<script>const tpl = "$1"; const msg = "sold out";</script><p>Coming soon</p>"#;
        let verdict = classifier.classify(&PageCapture::new("", markup));
        assert!(!verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::NoSignal);

        let markup = r#"<div id=app></div><script>window.__DATA__={"min":"MX$1,200.00"}</script>"#;
        let verdict = classifier.classify(&PageCapture::new("", markup));
        assert_eq!(verdict.reason, AvailabilityReason::NoSignal);
    }

    #[test]
    fn test_markup_sections_count() {
        let verdict = classify("", "<li>Section Floor</li><li>$300</li>");
        assert!(verdict.available);
        assert_eq!(verdict.reason, AvailabilityReason::SectionsListed);
    }

    #[test]
    fn test_extra_phrases() {
        let config = ExtractionConfig {
            extra_unavailable_phrases: vec!["Evento Cancelado".to_string()],
            ..Default::default()
        };
        let classifier = AvailabilityClassifier::new(&config);
        let verdict = classifier.classify(&PageCapture::text_only("EVENTO CANCELADO"));
        assert_eq!(verdict.reason, AvailabilityReason::SoldOutNotice);
    }

    #[test]
    fn test_has_sold_out_phrase_case_insensitive() {
        let classifier = AvailabilityClassifier::default();
        assert!(classifier.has_sold_out_phrase("SOLD OUT"));
        assert!(classifier.has_sold_out_phrase("No hay boletos disponibles"));
        assert!(!classifier.has_sold_out_phrase("On sale now"));
        assert!(!classifier.has_sold_out_phrase(""));
    }
}
