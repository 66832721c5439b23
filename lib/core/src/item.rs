use crate::attribute::{AttributeValue, Attributes};
use crate::filter::MaterialTypeFilter;
use serde::{Deserialize, Serialize};

/// A material product row from a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub application: String,
    pub eco_friendly: String,
    pub material_type: Option<String>,
    pub attributes: Attributes,
    /// Any further source columns, in source order
    pub extra: Vec<(String, String)>,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, application: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            application: application.into(),
            eco_friendly: String::new(),
            material_type: None,
            attributes,
            extra: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_eco_friendly(mut self, note: impl Into<String>) -> Self {
        self.eco_friendly = note.into();
        self
    }

    #[must_use]
    pub fn with_material_type(mut self, material_type: impl Into<String>) -> Self {
        self.material_type = Some(material_type.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((column.into(), value.into()));
        self
    }
}

/// A user's desired attribute profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub attributes: Attributes,
    /// Restrict ranking to rows of this material type
    pub material_type: Option<String>,
}

impl Query {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            material_type: None,
        }
    }

    /// Build a query from four level labels or numbers
    pub fn from_levels(
        strength: impl Into<AttributeValue>,
        cost: impl Into<AttributeValue>,
        water_resistance: impl Into<AttributeValue>,
        durability: impl Into<AttributeValue>,
    ) -> Self {
        Self::new(Attributes::new(strength, cost, water_resistance, durability))
    }

    #[must_use]
    pub fn with_material_type(mut self, material_type: impl Into<String>) -> Self {
        let material_type = material_type.into();
        self.material_type = if material_type.trim().is_empty() {
            None
        } else {
            Some(material_type)
        };
        self
    }

    /// Row filter implied by the material-type selector, if any
    pub fn filter(&self) -> Option<MaterialTypeFilter> {
        self.material_type.as_deref().map(MaterialTypeFilter::new)
    }
}
