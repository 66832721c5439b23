//! The four scored attributes of a material and their cell values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four attributes every material is ranked on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Strength,
    Cost,
    WaterResistance,
    Durability,
}

impl Attribute {
    /// All attributes in catalog column order
    pub const ALL: [Attribute; 4] = [
        Attribute::Strength,
        Attribute::Cost,
        Attribute::WaterResistance,
        Attribute::Durability,
    ];

    /// Column header used by catalog sources
    pub fn column(self) -> &'static str {
        match self {
            Attribute::Strength => "Strength",
            Attribute::Cost => "Cost",
            Attribute::WaterResistance => "Water Resistance",
            Attribute::Durability => "Durability",
        }
    }

    /// Machine key used in JSON payloads and explanations
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Strength => "strength",
            Attribute::Cost => "cost",
            Attribute::WaterResistance => "water_resistance",
            Attribute::Durability => "durability",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Attribute::ALL
            .into_iter()
            .find(|a| a.column().eq_ignore_ascii_case(s) || a.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown attribute '{}'", s))
    }
}

/// A single attribute cell: a categorical level, a pre-encoded number, or nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Level(String),
    Numeric(f32),
    Missing,
}

impl AttributeValue {
    /// Interpret a raw text cell.
    ///
    /// Blank cells are `Missing`, finite numbers are `Numeric`, everything
    /// else is kept verbatim (trimmed) as a `Level` label.
    pub fn parse_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return AttributeValue::Missing;
        }
        match trimmed.parse::<f32>() {
            Ok(n) if n.is_finite() => AttributeValue::Numeric(n),
            _ => AttributeValue::Level(trimmed.to_string()),
        }
    }

    pub fn level(label: impl Into<String>) -> Self {
        AttributeValue::Level(label.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, AttributeValue::Missing)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Level(label) => f.write_str(label),
            AttributeValue::Numeric(n) => write!(f, "{}", n),
            AttributeValue::Missing => f.write_str("-"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(raw: &str) -> Self {
        AttributeValue::parse_cell(raw)
    }
}

impl From<f32> for AttributeValue {
    fn from(n: f32) -> Self {
        AttributeValue::Numeric(n)
    }
}

/// The four attribute values of a catalog row or a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: AttributeValue,
    pub cost: AttributeValue,
    pub water_resistance: AttributeValue,
    pub durability: AttributeValue,
}

impl Attributes {
    pub fn new(
        strength: impl Into<AttributeValue>,
        cost: impl Into<AttributeValue>,
        water_resistance: impl Into<AttributeValue>,
        durability: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            strength: strength.into(),
            cost: cost.into(),
            water_resistance: water_resistance.into(),
            durability: durability.into(),
        }
    }

    /// Same value for all four attributes
    pub fn uniform(value: impl Into<AttributeValue>) -> Self {
        let value = value.into();
        Self {
            strength: value.clone(),
            cost: value.clone(),
            water_resistance: value.clone(),
            durability: value,
        }
    }

    pub fn get(&self, attribute: Attribute) -> &AttributeValue {
        match attribute {
            Attribute::Strength => &self.strength,
            Attribute::Cost => &self.cost,
            Attribute::WaterResistance => &self.water_resistance,
            Attribute::Durability => &self.durability,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: AttributeValue) {
        match attribute {
            Attribute::Strength => self.strength = value,
            Attribute::Cost => self.cost = value,
            Attribute::WaterResistance => self.water_resistance = value,
            Attribute::Durability => self.durability = value,
        }
    }

    /// Iterate in catalog column order
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &AttributeValue)> + '_ {
        Attribute::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}
