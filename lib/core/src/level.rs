//! Categorical level lookup
//!
//! Converts level labels such as `Low`/`Medium`/`High` into points on a
//! numeric scale so catalog rows can be compared arithmetically. The mapping
//! is an explicit table; nothing is coerced implicitly.

use crate::attribute::{Attribute, AttributeValue, Attributes};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label-to-number lookup table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelMap {
    levels: BTreeMap<String, f32>,
}

impl Default for LevelMap {
    fn default() -> Self {
        Self::new([("Low", 3.0), ("Medium", 6.0), ("High", 9.0)])
    }
}

impl LevelMap {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Reject empty tables and non-finite scale values
    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(Error::InvalidConfig("level map cannot be empty".into()));
        }
        if let Some((label, _)) = self.levels.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "level '{}' has a non-finite value",
                label
            )));
        }
        Ok(())
    }

    pub fn insert(&mut self, label: impl Into<String>, value: f32) {
        self.levels.insert(label.into(), value);
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Look up a label. Labels match exactly after trimming.
    pub fn get(&self, label: &str) -> Option<f32> {
        self.levels.get(label.trim()).copied()
    }

    /// Numeric representation of a cell, if it has one.
    ///
    /// Pre-encoded numbers pass through unchanged; missing cells and
    /// unmapped labels resolve to `None`.
    pub fn resolve(&self, value: &AttributeValue) -> Option<f32> {
        match value {
            AttributeValue::Level(label) => self.get(label),
            AttributeValue::Numeric(n) if n.is_finite() => Some(*n),
            AttributeValue::Numeric(_) | AttributeValue::Missing => None,
        }
    }

    /// Resolve all four attributes in column order, or `None` if any fails
    pub fn resolve_all(&self, attributes: &Attributes) -> Option<[f32; 4]> {
        let mut out = [0.0f32; 4];
        for (slot, attribute) in out.iter_mut().zip(Attribute::ALL) {
            *slot = self.resolve(attributes.get(attribute))?;
        }
        Some(out)
    }

    /// Labels ordered by ascending scale value, ties by label
    pub fn labels(&self) -> Vec<(&str, f32)> {
        let mut labels: Vec<(&str, f32)> =
            self.levels.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        labels.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        let map = LevelMap::default();
        assert_eq!(map.get("Low"), Some(3.0));
        assert_eq!(map.get("Medium"), Some(6.0));
        assert_eq!(map.get("High"), Some(9.0));
        assert_eq!(map.get(" High "), Some(9.0));
        assert_eq!(map.get("high"), None);
        assert_eq!(map.get("Very High"), None);
    }

    #[test]
    fn test_resolve_values() {
        let map = LevelMap::default();
        assert_eq!(map.resolve(&AttributeValue::level("Medium")), Some(6.0));
        assert_eq!(map.resolve(&AttributeValue::Numeric(4.5)), Some(4.5));
        assert_eq!(map.resolve(&AttributeValue::Numeric(f32::NAN)), None);
        assert_eq!(map.resolve(&AttributeValue::Missing), None);
        assert_eq!(map.resolve(&AttributeValue::level("Extreme")), None);
    }

    #[test]
    fn test_resolve_all_fails_on_any_gap() {
        let map = LevelMap::default();
        let ok = Attributes::new("Low", "Medium", "High", 7.0);
        assert_eq!(map.resolve_all(&ok), Some([3.0, 6.0, 9.0, 7.0]));

        let gap = Attributes::new("Low", "Medium", "Unknown", "High");
        assert_eq!(map.resolve_all(&gap), None);
    }

    #[test]
    fn test_labels_sorted_by_value() {
        let map = LevelMap::default();
        let labels: Vec<&str> = map.labels().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Low", "Medium", "High"]);
    }

    #[test]
    fn test_validate() {
        assert!(LevelMap::default().validate().is_ok());
        assert!(matches!(
            LevelMap::new(Vec::<(String, f32)>::new()).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(LevelMap::new([("Low", f32::INFINITY)]).validate().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let map: LevelMap = serde_json::from_str(r#"{"Low": 1, "High": 10}"#).unwrap();
        assert_eq!(map.get("Low"), Some(1.0));
        assert_eq!(map.get("High"), Some(10.0));
        assert_eq!(map.len(), 2);
    }
}
