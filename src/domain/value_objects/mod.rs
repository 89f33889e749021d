//! Value Objects for the product catalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Document identifier assigned by the catalog on insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self { Self(Uuid::now_v7()) }
}

impl Default for RecordId { fn default() -> Self { Self::new() } }

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for RecordId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s).map(Self) }
}

/// URL-safe form of a product title.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Transliterates `title` to ASCII, lowercases it and collapses every
    /// run of non-alphanumeric characters into a single `-`. Leading and
    /// trailing runs are dropped.
    pub fn from_title(title: &str) -> Self {
        let ascii = deunicode::deunicode(title);
        let mut slug = String::with_capacity(ascii.len());
        let mut pending_separator = false;
        for c in ascii.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('-');
                }
                pending_separator = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_separator = true;
            }
        }
        Self(slug)
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_string(self) -> String { self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Ratings average bounds and rounding.
pub struct Rating;

impl Rating {
    pub const DEFAULT: f64 = 4.5;
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 5.0;

    /// Rounds to one decimal place, halves away from zero.
    pub fn round(value: f64) -> f64 { (value * 10.0).round() / 10.0 }
}

/// Product price: a plain amount, a structured price record whose shape
/// is owned by the pricing side of the catalog, or any other value a
/// supplier sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(Decimal),
    Structured(serde_json::Map<String, serde_json::Value>),
    Other(serde_json::Value),
}

impl Price {
    fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Amount(amount) => Some(*amount),
            Self::Structured(_) | Self::Other(_) => None,
        }
    }

    /// Whether `discount` is strictly below this price. Only plain amounts
    /// are comparable; nothing is below any other shape.
    pub fn is_above(&self, discount: Decimal) -> bool {
        self.amount().is_some_and(|amount| discount < amount)
    }
}

/// RoHS compliance as suppliers report it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RohsStatus {
    Flag(bool),
    Text(String),
    Detail(serde_json::Value),
}

#[derive(Debug, Clone, Error)]
#[error("`{value}` is not a valid enum value for path `{path}`")]
pub struct EnumValueError { path: &'static str, value: String }

/// Energy limiting class of a circuit breaker (IEC 60898-1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EnergyLimitingClass { One = 1, Two = 2, Three = 3 }

impl TryFrom<u8> for EnergyLimitingClass {
    type Error = EnumValueError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(EnumValueError { path: "technical.energyLimitingClass", value: other.to_string() }),
        }
    }
}

impl From<EnergyLimitingClass> for u8 {
    fn from(class: EnergyLimitingClass) -> Self { class as u8 }
}

/// Overvoltage category (IEC 60664-1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OvervoltageCategory { I, II, III, IV, V }

impl OvervoltageCategory {
    pub fn as_str(&self) -> &'static str {
        match self { Self::I => "I", Self::II => "II", Self::III => "III", Self::IV => "IV", Self::V => "V" }
    }
}

impl TryFrom<String> for OvervoltageCategory {
    type Error = EnumValueError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "I" => Ok(Self::I),
            "II" => Ok(Self::II),
            "III" => Ok(Self::III),
            "IV" => Ok(Self::IV),
            "V" => Ok(Self::V),
            _ => Err(EnumValueError { path: "technical.overvoltageCategory", value }),
        }
    }
}

impl From<OvervoltageCategory> for String {
    fn from(category: OvervoltageCategory) -> Self { category.as_str().to_string() }
}

impl fmt::Display for OvervoltageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
