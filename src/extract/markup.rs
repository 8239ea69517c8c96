//! Raw markup helpers: the fallback section pass and visible-text recovery.

use super::money::{find_money, money_start, MoneyToken};
use super::patterns::{HIDDEN_ELEMENTS, MARKUP_SECTION};
use super::section::SectionName;
use scraper::Html;
use std::ops::Range;
use tracing::trace;

/// A section text node found in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupHit {
    /// Byte offset where the whole match starts
    pub start: usize,
    /// Byte range of the node text after the introducer
    pub label: Range<usize>,
}

/// Finds every text node that starts with a section introducer.
pub fn section_hits(markup: &str) -> Vec<MarkupHit> {
    MARKUP_SECTION
        .captures_iter(markup)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(1)?;
            Some(MarkupHit { start: whole.start(), label: label.range() })
        })
        .collect()
}

/// Scans markup for section text nodes and the first price after each.
///
/// A price inside the node itself wins. Otherwise up to `window` bytes after
/// the node are searched, stopping early at the next section node.
pub fn scan_sections(
    markup: &str,
    window: usize,
    max_label_chars: usize,
) -> Vec<(SectionName, MoneyToken)> {
    let hits = section_hits(markup);
    let mut found = Vec::with_capacity(hits.len());

    for (idx, hit) in hits.iter().enumerate() {
        let node_text = decode_entities(&markup[hit.label.clone()]);
        let (label, same_node) = split_label(&node_text);

        let Some(section) = SectionName::canonicalize(label) else {
            continue;
        };
        if section.char_len() > max_label_chars {
            trace!("Skipping overlong markup label: {}", section);
            continue;
        }

        let token = if same_node.is_found() {
            same_node
        } else {
            let start = hit.label.end;
            let next = hits.get(idx + 1).map_or(markup.len(), |h| h.start);
            let end = floor_char_boundary(markup, start.saturating_add(window).min(next));
            find_money(&markup[start..end.max(start)])
        };

        found.push((section, token));
    }

    found
}

/// Splits node or line text into the label before its first price and that price.
pub fn split_label(text: &str) -> (&str, MoneyToken) {
    match money_start(text) {
        Some(start) => (trim_label(&text[..start]), find_money(&text[start..])),
        None => (trim_label(text), MoneyToken::Absent),
    }
}

/// Trims whitespace and trailing separators from a label.
pub fn trim_label(label: &str) -> &str {
    label.trim().trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, ':' | '-' | '|' | '–' | '—' | '·' | ',')
    })
}

/// Decodes the handful of entities that show up in section labels.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#36;", "$")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collects the text a browser would render from raw markup.
///
/// Text inside script, style, noscript, and template elements is skipped.
pub fn visible_text(markup: &str) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }

    let document = Html::parse_document(markup);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        let fragment = fragment.trim();
        if !fragment.is_empty() {
            text.push_str(fragment);
            text.push('\n');
        }
    }

    text
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::money::Price;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn scan(markup: &str) -> Vec<(String, Option<Price>)> {
        scan_sections(markup, 400, 48)
            .into_iter()
            .map(|(section, token)| (section.to_string(), token.price()))
            .collect()
    }

    #[test]
    fn test_scan_price_after_node() {
        let markup = r#"<li><span class="name">Section VIP</span><span class="price">MX$1,250.00</span></li>"#;
        assert_eq!(scan(markup), vec![("VIP".to_string(), Some(price("1250.00")))]);
    }

    #[test]
    fn test_scan_price_in_same_node() {
        let markup = "<div>Section Platea A: $900</div><div>$100</div>";
        assert_eq!(scan(markup), vec![("PLATEA A".to_string(), Some(price("900")))]);
    }

    #[test]
    fn test_scan_window_stops_at_next_section() {
        let markup = "<p>Section A</p><p>Section B</p><p>$50</p>";
        assert_eq!(
            scan(markup),
            vec![("A".to_string(), None), ("B".to_string(), Some(price("50")))]
        );
    }

    #[test]
    fn test_scan_window_is_bounded() {
        let filler = "<i></i>".repeat(100);
        let markup = format!("<p>Section A</p>{}<p>$50</p>", filler);
        let found = scan_sections(&markup, 400, 48);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, MoneyToken::Absent);
    }

    #[test]
    fn test_scan_ignores_attribute_values() {
        let markup = r#"<div title="Section Z $10"></div><p>nothing</p>"#;
        assert!(scan(markup).is_empty());
    }

    #[test]
    fn test_scan_decodes_entities() {
        let markup = "<b>Secci&oacute;n</b><b>Section&nbsp;Box&nbsp;&amp;&nbsp;Bar</b><i>$75</i>";
        assert_eq!(scan(markup), vec![("BOX & BAR".to_string(), Some(price("75")))]);
    }

    #[test]
    fn test_scan_window_respects_multibyte_text() {
        let markup = "<p>Section A</p><p>ñññññ $5</p>";
        // Window ends in the middle of a two-byte character
        let found = scan_sections(markup, 8, 48);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, MoneyToken::Absent);
    }

    #[test]
    fn test_split_label() {
        assert_eq!(split_label("VIP: $500"), ("VIP", MoneyToken::Parsed(price("500"))));
        assert_eq!(split_label("General Admission"), ("General Admission", MoneyToken::Absent));
        assert_eq!(split_label("Zona B - MXN 1,000 c/u").0, "Zona B");
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let markup = r#"
            <html><head><style>.x { color: red }</style>
            <script>var s = "$1"; var t = "Sold out";</script></head>
            <body><h1>Concert</h1><p>Sold out</p><noscript>$9</noscript></body></html>
        "#;
        let text = visible_text(markup);
        assert!(text.contains("Concert"));
        assert!(text.contains("Sold out"));
        assert!(!text.contains("$1"));
        assert!(!text.contains("$9"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_visible_text_empty() {
        assert_eq!(visible_text(""), "");
        assert_eq!(visible_text("   "), "");
    }
}
