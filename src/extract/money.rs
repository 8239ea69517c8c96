//! Monetary amounts: the `Price` type and currency-token parsing.

use super::patterns::MONEY;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A non-negative amount with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Rounds `amount` to two fractional digits. Negative amounts are rejected.
    pub fn new(amount: Decimal) -> Option<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return None;
        }
        let mut rounded = amount.round_dp(2);
        rounded.rescale(2);
        Some(Self(rounded))
    }

    /// Creates a price from a whole number of cents.
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Converts a float (e.g. from a legacy snapshot file).
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).and_then(Self::new)
    }

    /// The underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount as a float, for serialization.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Absolute difference between two prices.
    pub fn abs_diff(self, other: Price) -> Price {
        Self((self.0 - other.0).abs())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = String;

    /// Parses a plain decimal such as "1250.00".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|e| format!("Invalid amount '{}': {}", s, e))?;
        Self::new(amount).ok_or_else(|| format!("Negative amount: {}", s))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative decimal amount")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        Price::from_f64(v).ok_or_else(|| E::custom(format!("invalid amount: {}", v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Price::new(Decimal::from(v)).ok_or_else(|| E::custom(format!("invalid amount: {}", v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Price::new(Decimal::from(v)).ok_or_else(|| E::custom(format!("invalid amount: {}", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

/// Outcome of looking for a currency token in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyToken {
    /// No currency token in the text.
    Absent,
    /// A token matched but its number did not parse.
    Unparsable(String),
    /// A token matched and parsed.
    Parsed(Price),
}

impl MoneyToken {
    /// True unless nothing matched.
    pub fn is_found(&self) -> bool {
        !matches!(self, MoneyToken::Absent)
    }

    /// The parsed price, if any.
    pub fn price(&self) -> Option<Price> {
        match self {
            MoneyToken::Parsed(price) => Some(*price),
            _ => None,
        }
    }
}

/// Parses a raw currency token such as "MX$1,250.00" into a price.
///
/// Commas are thousands separators and are dropped. Returns `None` when what
/// remains is not a number.
pub fn parse_money(raw: &str) -> Option<Price> {
    let cleaned: String =
        raw.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();

    let normalized = cleaned.replace(',', "");
    if normalized.is_empty() {
        return None;
    }

    Decimal::from_str(&normalized).ok().and_then(Price::new)
}

/// Finds the first currency token in `text` and parses it.
pub fn find_money(text: &str) -> MoneyToken {
    match MONEY.find(text) {
        Some(m) => match parse_money(m.as_str()) {
            Some(price) => MoneyToken::Parsed(price),
            None => MoneyToken::Unparsable(m.as_str().to_string()),
        },
        None => MoneyToken::Absent,
    }
}

/// Byte offset where the first currency token in `text` starts.
pub fn money_start(text: &str) -> Option<usize> {
    MONEY.find(text).map(|m| m.start())
}

/// Returns true if `text` contains any currency token.
pub fn contains_money(text: &str) -> bool {
    MONEY.is_match(text)
}
