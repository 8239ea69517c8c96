//! Section and price extraction from captured listing pages.

pub mod availability;
pub mod markup;
pub mod models;
pub mod money;
pub mod parser;
pub mod patterns;
pub mod section;

pub use availability::{AvailabilityClassifier, AvailabilityReason, AvailabilityVerdict};
pub use models::{Disagreement, Extraction, PageCapture, Pass, SectionPriceMap, Source};
pub use money::{parse_money, MoneyToken, Price};
pub use parser::Extractor;
pub use section::SectionName;
