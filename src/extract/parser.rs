//! Section-price extraction from page text and markup.

use super::markup::{scan_sections, split_label, trim_label};
use super::models::{Disagreement, Extraction, PageCapture, Pass, SectionPriceMap, Source};
use super::money::{find_money, money_start, MoneyToken, Price};
use super::patterns::{EXPLICIT_LINE, IMPLICIT_PREFIXES};
use super::section::SectionName;
use crate::config::{ExtractionConfig, MarkupPolicy};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Extracts `section -> lowest price` mappings from raw page content.
#[derive(Debug, Clone)]
pub struct Extractor {
    lookahead_lines: usize,
    markup_window: usize,
    max_label_chars: usize,
    markup: MarkupPolicy,
    prefixes: Vec<String>,
    tolerance: Price,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl Extractor {
    /// Creates an extractor from configuration.
    pub fn new(config: &ExtractionConfig) -> Self {
        let mut prefixes: Vec<String> = IMPLICIT_PREFIXES.iter().map(|p| p.to_string()).collect();
        prefixes.extend(config.extra_prefixes.iter().map(|p| p.trim().to_lowercase()));

        Self {
            lookahead_lines: config.lookahead_lines,
            markup_window: config.markup_window,
            max_label_chars: config.max_label_chars,
            markup: config.markup,
            prefixes,
            tolerance: Price::from_f64(config.disagreement_tolerance)
                .unwrap_or_else(|| Price::from_cents(1)),
        }
    }

    /// Extracts sections from a single page capture.
    pub fn extract(&self, capture: &PageCapture) -> Extraction {
        self.extract_sources(&[Source::Text(&capture.text), Source::Markup(&capture.markup)])
    }

    /// Extracts sections from any number of sources for one target.
    ///
    /// Text sources run the explicit and implicit passes. Markup sources run
    /// the markup pass according to the configured policy. All results are
    /// merged keeping the lowest price per section.
    pub fn extract_sources(&self, sources: &[Source<'_>]) -> Extraction {
        let mut explicit = SectionPriceMap::new();
        let mut implicit = SectionPriceMap::new();

        for source in sources {
            if let Source::Text(text) = source {
                let lines: Vec<&str> = text.lines().map(str::trim).collect();
                explicit.extend(self.explicit_pass(&lines));
                implicit.extend(self.implicit_pass(&lines));
            }
        }

        let run_markup = match self.markup {
            MarkupPolicy::Always => true,
            MarkupPolicy::Fallback => explicit.is_empty() && implicit.is_empty(),
            MarkupPolicy::Never => false,
        };

        let mut markup = SectionPriceMap::new();
        if run_markup {
            for source in sources {
                if let Source::Markup(raw) = source {
                    markup.extend(self.markup_pass(raw));
                }
            }
        }

        debug!(
            "Extracted sections (explicit: {}, implicit: {}, markup: {})",
            explicit.len(),
            implicit.len(),
            markup.len()
        );

        let per_pass = [(Pass::Explicit, explicit), (Pass::Implicit, implicit), (Pass::Markup, markup)];
        let disagreements = self.find_disagreements(&per_pass);

        let sections = per_pass
            .into_iter()
            .fold(SectionPriceMap::new(), |merged, (_, map)| merged.merge(map));

        Extraction { sections, disagreements }
    }

    /// Lines that are exactly "Section <label>", priced by the next lines.
    pub fn explicit_pass(&self, lines: &[&str]) -> SectionPriceMap {
        let mut found = SectionPriceMap::new();

        for (i, line) in lines.iter().enumerate() {
            let Some(caps) = EXPLICIT_LINE.captures(line) else {
                continue;
            };
            let label = caps.get(1).map_or("", |m| m.as_str());
            if money_start(label).is_some() {
                trace!("explicit: skipping priced line {:?}", line);
                continue;
            }
            let Some(section) = SectionName::canonicalize(trim_label(label)) else {
                continue;
            };
            if section.char_len() > self.max_label_chars {
                trace!("explicit: skipping overlong label {:?}", label);
                continue;
            }

            match self.lookahead(lines, i) {
                MoneyToken::Parsed(price) => {
                    trace!("explicit: {} = {}", section, price);
                    found.insert_min(section, price);
                }
                MoneyToken::Unparsable(raw) => {
                    trace!("explicit: {} has unparsable price {:?}", section, raw);
                }
                MoneyToken::Absent => {
                    trace!("explicit: {} has no price within {} lines", section, self.lookahead_lines);
                }
            }
        }

        found
    }

    /// Lines led by a known section word, priced on the line or the next lines.
    pub fn implicit_pass(&self, lines: &[&str]) -> SectionPriceMap {
        let mut found = SectionPriceMap::new();

        for (i, line) in lines.iter().enumerate() {
            if !self.has_section_prefix(line) {
                continue;
            }

            let (label, same_line) = split_label(line);
            let Some(section) = SectionName::canonicalize(label) else {
                continue;
            };
            if section.char_len() > self.max_label_chars {
                trace!("implicit: skipping overlong label {:?}", label);
                continue;
            }

            let token = if same_line.is_found() { same_line } else { self.lookahead(lines, i) };

            match token {
                MoneyToken::Parsed(price) => {
                    trace!("implicit: {} = {}", section, price);
                    found.insert_min(section, price);
                }
                MoneyToken::Unparsable(raw) => {
                    trace!("implicit: {} has unparsable price {:?}", section, raw);
                }
                MoneyToken::Absent => {}
            }
        }

        found
    }

    /// Section text nodes in raw markup, priced from a trailing window.
    pub fn markup_pass(&self, markup: &str) -> SectionPriceMap {
        scan_sections(markup, self.markup_window, self.max_label_chars)
            .into_iter()
            .filter_map(|(section, token)| token.price().map(|price| (section, price)))
            .collect()
    }

    /// Returns true if the line's first word is in the section vocabulary.
    pub fn has_section_prefix(&self, line: &str) -> bool {
        let word: String = line.chars().take_while(|c| c.is_alphabetic()).collect();
        if word.is_empty() {
            return false;
        }
        let word = word.to_lowercase();
        self.prefixes.iter().any(|p| *p == word)
    }

    /// First currency token in the lines after `index`.
    fn lookahead(&self, lines: &[&str], index: usize) -> MoneyToken {
        lines
            .iter()
            .skip(index + 1)
            .take(self.lookahead_lines)
            .map(|line| find_money(line))
            .find(MoneyToken::is_found)
            .unwrap_or(MoneyToken::Absent)
    }

    fn find_disagreements(&self, per_pass: &[(Pass, SectionPriceMap)]) -> Vec<Disagreement> {
        let mut by_section: BTreeMap<&SectionName, Vec<(Pass, Price)>> = BTreeMap::new();
        for (pass, map) in per_pass {
            for (section, price) in map.iter() {
                by_section.entry(section).or_default().push((*pass, price));
            }
        }

        let mut disagreements = Vec::new();
        for (section, prices) in by_section {
            if prices.len() < 2 {
                continue;
            }

            let disagreement = Disagreement { section: section.clone(), prices };
            if disagreement.spread() > self.tolerance {
                warn!(
                    "Extraction passes disagree on section {}: {}",
                    section,
                    disagreement
                        .prices
                        .iter()
                        .map(|(pass, price)| format!("{}={}", pass, price))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                disagreements.push(disagreement);
            }
        }

        disagreements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn extract_text(text: &str) -> SectionPriceMap {
        Extractor::default().extract(&PageCapture::text_only(text)).sections
    }

    fn pairs(map: &SectionPriceMap) -> Vec<(String, String)> {
        map.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_explicit_label_price_after_blank_line() {
        let map = extract_text("SECTION VIP\n\n$1,250.00\n");
        assert_eq!(pairs(&map), vec![("VIP".to_string(), "1250.00".to_string())]);
    }

    #[test]
    fn test_explicit_lookahead_is_four_lines() {
        let within = "Section A\n1\n2\n3\n$40";
        assert_eq!(extract_text(within).get("A"), Some(price("40")));

        let beyond = "Section A\n1\n2\n3\n4\n$40";
        assert!(extract_text(beyond).get("A").is_none());
    }

    #[test]
    fn test_explicit_takes_first_price() {
        let map = extract_text("Section B\nDesde MX$800\nHasta MX$1,600");
        assert_eq!(map.get("B"), Some(price("800")));
    }

    #[test]
    fn test_explicit_label_shapes() {
        assert_eq!(extract_text("Section A:\n$10").get("A"), Some(price("10")));
        assert_eq!(extract_text("Section 101 (Floor)\n$10").get("101 (FLOOR)"), Some(price("10")));
        assert_eq!(extract_text("Section A\u{a0}B\n$10").get("A B"), Some(price("10")));
        assert_eq!(extract_text("Sector Norte -\n$10").get("NORTE"), Some(price("10")));
    }

    #[test]
    fn test_explicit_skips_same_line_price() {
        // The trailing price must not be read as part of the label
        assert!(extract_text("Section VIP $500\n$10").is_empty());
    }

    #[test]
    fn test_explicit_skips_prose() {
        let text = "Section 8 of the terms applies to every ticket purchased through this site\n$20";
        assert!(extract_text(text).is_empty());
    }

    #[test]
    fn test_explicit_requires_whole_line() {
        let map = extract_text("Buy tickets for Section C now\n$99");
        assert!(map.is_empty());
    }

    #[test]
    fn test_label_without_price_contributes_nothing() {
        let map = extract_text("Section D\nNo price listed\n");
        assert!(map.is_empty());
    }

    #[test]
    fn test_implicit_same_line() {
        let map = extract_text("VIP Box: $2,500.00\nPlatea A - MX$ 900");
        assert_eq!(map.get("VIP BOX"), Some(price("2500")));
        assert_eq!(map.get("PLATEA A"), Some(price("900")));
    }

    #[test]
    fn test_implicit_lookahead() {
        let map = extract_text("General Admission\nAvailable\n$350");
        assert_eq!(map.get("GENERAL ADMISSION"), Some(price("350")));
    }

    #[test]
    fn test_implicit_lookahead_is_four_lines() {
        let within = "General\n1\n2\n3\n$5";
        assert_eq!(extract_text(within).get("GENERAL"), Some(price("5")));

        let beyond = "General\n1\n2\n3\n4\n$5";
        assert!(extract_text(beyond).is_empty());
    }

    #[test]
    fn test_unparsable_first_price_records_nothing() {
        // The first token decides; the later valid price is never reached
        let huge = format!("${}", "9".repeat(40));
        assert!(matches!(find_money(&huge), MoneyToken::Unparsable(_)));

        let explicit = format!("Section A\n{}\n$10", huge);
        assert!(extract_text(&explicit).is_empty());

        let implicit = format!("Palco 3\n{}\n$10", huge);
        assert!(extract_text(&implicit).is_empty());
    }

    #[test]
    fn test_explicit_rounds_long_decimals() {
        let map = extract_text("Section VIP\n$1,250.999");
        assert_eq!(map.get("VIP"), Some(price("1251.00")));
    }

    #[test]
    fn test_implicit_same_line_wins_over_lookahead() {
        let map = extract_text("Palco 3 $5,000\n$100");
        assert_eq!(map.get("PALCO 3"), Some(price("5000")));
    }

    #[test]
    fn test_implicit_prefix_must_be_whole_word() {
        let map = extract_text("Gallery walk $20\nVipers fan club $10");
        assert!(map.is_empty());
    }

    #[test]
    fn test_implicit_prefix_allows_trailing_digits() {
        let map = extract_text("GA1 $150");
        assert_eq!(map.get("GA1"), Some(price("150")));
    }

    #[test]
    fn test_implicit_skips_prose() {
        let text = "General information about parking, doors, and the bag policy for this venue\n$20";
        assert!(extract_text(text).is_empty());
    }

    #[test]
    fn test_passes_merge_to_minimum() {
        // The explicit and implicit passes both produce "VIP"
        let map = extract_text("Section VIP\n$1,500\nVIP $1,200");
        assert_eq!(map.get("VIP"), Some(price("1200")));
    }

    #[test]
    fn test_repeated_section_keeps_minimum() {
        let map = extract_text("Section A\n$300\nSection A\n$250\nSection A\n$275");
        assert_eq!(map.get("A"), Some(price("250")));
    }

    #[test]
    fn test_two_text_sources_merge() {
        let extractor = Extractor::default();
        let result = extractor
            .extract_sources(&[Source::Text("Section A\n$200.00"), Source::Text("Section A\n$150.00")]);
        assert_eq!(pairs(&result.sections), vec![("A".to_string(), "150.00".to_string())]);
    }

    #[test]
    fn test_markup_fallback_only_when_text_empty() {
        let extractor = Extractor::default();
        let markup = "<div>Section Z</div><span>$10</span>";

        let result = extractor.extract(&PageCapture::new("", markup));
        assert_eq!(result.sections.get("Z"), Some(price("10")));

        let result = extractor.extract(&PageCapture::new("Section A\n$50", markup));
        assert_eq!(result.sections.get("A"), Some(price("50")));
        assert!(!result.sections.contains("Z"));
    }

    #[test]
    fn test_markup_policy_always_and_never() {
        let markup = "<div>Section Z</div><span>$10</span>";
        let capture = PageCapture::new("Section A\n$50", markup);

        let config = ExtractionConfig { markup: MarkupPolicy::Always, ..Default::default() };
        let result = Extractor::new(&config).extract(&capture);
        assert_eq!(result.sections.len(), 2);

        let config = ExtractionConfig { markup: MarkupPolicy::Never, ..Default::default() };
        let result = Extractor::new(&config).extract(&PageCapture::new("", markup));
        assert!(result.sections.is_empty());
    }

    #[test]
    fn test_disagreement_reported_without_changing_output() {
        let config = ExtractionConfig { markup: MarkupPolicy::Always, ..Default::default() };
        let capture = PageCapture::new("Section A\n$200", "<p>Section A</p><p>$150</p>");

        let result = Extractor::new(&config).extract(&capture);
        assert_eq!(result.sections.get("A"), Some(price("150")));
        assert_eq!(result.disagreements.len(), 1);
        assert_eq!(result.disagreements[0].section.as_str(), "A");
        assert_eq!(
            result.disagreements[0].prices,
            vec![(Pass::Explicit, price("200")), (Pass::Markup, price("150"))]
        );
    }

    #[test]
    fn test_agreement_within_tolerance() {
        let map = Extractor::default().extract(&PageCapture::text_only("Section VIP\n$100\nVIP $100"));
        assert_eq!(map.sections.get("VIP"), Some(price("100")));
        assert!(map.disagreements.is_empty());
    }

    #[test]
    fn test_custom_lookahead_and_prefixes() {
        let config = ExtractionConfig {
            lookahead_lines: 1,
            extra_prefixes: vec!["Cancha".to_string()],
            ..Default::default()
        };
        let extractor = Extractor::new(&config);

        let result = extractor.extract(&PageCapture::text_only("Section A\n\n$40\nCancha Norte $75"));
        assert!(!result.sections.contains("A"));
        assert_eq!(result.sections.get("CANCHA NORTE"), Some(price("75")));
    }

    #[test]
    fn test_empty_input_is_empty_result() {
        let result = Extractor::default().extract(&PageCapture::default());
        assert!(result.sections.is_empty());
        assert!(result.disagreements.is_empty());
    }

    #[test]
    fn test_has_section_prefix() {
        let extractor = Extractor::default();
        assert!(extractor.has_section_prefix("Preferente B"));
        assert!(extractor.has_section_prefix("BALCÓN 2"));
        assert!(extractor.has_section_prefix("vip"));
        assert!(!extractor.has_section_prefix("Section A"));
        assert!(!extractor.has_section_prefix("$100"));
        assert!(!extractor.has_section_prefix(""));
    }
}
