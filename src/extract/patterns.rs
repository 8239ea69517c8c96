//! Text patterns used for section and price extraction.
//!
//! This file contains every pattern and vocabulary the extractor and the
//! availability classifier match against. Update this file when listing pages
//! change their wording.
//!
//! **Update process**: when a page stops yielding sections, capture its text
//! and markup, adjust the patterns here, and add a fixture under
//! `tests/fixtures/`.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Leading section introducer followed by whitespace ("Section ", "Sección ").
pub static INTRODUCER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:section|secci[oóÓ]n|sector)(?:\s|\x{A0})+").unwrap()
});

/// A whole (trimmed) line made of an introducer and a label, e.g. "SECTION VIP".
///
/// The capture is the raw remainder; callers reject same-line prices and
/// trim trailing separators.
pub static EXPLICIT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:section|secci[oóÓ]n|sector)(?:\s|\x{A0})+(.+)$").unwrap()
});

/// A currency symbol or code followed by a grouped/decimal amount.
///
/// All decimal digits are taken; `Price` rounds them to cents.
pub static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:MXN|USD|EUR|MX\$|US\$|\$|€|£)(?:\s|\x{A0})?\d[\d,]*(?:\.\d+)?").unwrap()
});

/// Node text strictly between two tag delimiters that starts with an introducer.
///
/// Group 1 is the rest of the node text (label, possibly followed by a price).
pub static MARKUP_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)>(?:\s|\x{A0}|&nbsp;)*(?:section|secci[oóÓ]n|sector)(?:\s|\x{A0}|&nbsp;)+([^<>]+)<",
    )
    .unwrap()
});

/// Leading words that mark a line as a section label without an introducer.
///
/// Matched against the first run of alphabetic characters, lowercased.
pub const IMPLICIT_PREFIXES: &[&str] = &[
    "general",
    "gral",
    "ga",
    "admission",
    "admisión",
    "admision",
    "preferente",
    "platea",
    "palco",
    "palcos",
    "box",
    "vip",
    "zona",
    "zone",
    "tier",
    "nivel",
    "level",
    "balcón",
    "balcon",
    "balcony",
    "luneta",
    "mezzanine",
    "floor",
    "pista",
    "orchestra",
    "orquesta",
    "lower",
    "upper",
    "club",
    "grada",
    "gradas",
    "suite",
    "loge",
    "terrace",
];

/// Lowercase phrases that signal a listing has nothing on sale.
pub const UNAVAILABLE_PHRASES: &[&str] = &[
    "sold out",
    "soldout",
    "agotado",
    "no tickets available",
    "tickets unavailable",
    "currently unavailable",
    "not available",
    "no disponible",
    "no hay boletos",
    "sin disponibilidad",
    "no quedan boletos",
];

/// Elements whose text never renders on the page.
pub const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];
