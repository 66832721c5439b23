// Row filters applied before scoring
use crate::CatalogItem;

pub trait Filter {
    fn matches(&self, item: &CatalogItem) -> bool;
}

/// Keeps rows of one material type.
///
/// Comparison is case-insensitive on trimmed values. Rows that carry no
/// material type are kept, since a catalog without that column is already a
/// single category.
#[derive(Debug, Clone)]
pub struct MaterialTypeFilter {
    material_type: String,
}

impl MaterialTypeFilter {
    pub fn new(material_type: &str) -> Self {
        Self {
            material_type: material_type.trim().to_string(),
        }
    }

    pub fn material_type(&self) -> &str {
        &self.material_type
    }
}

impl Filter for MaterialTypeFilter {
    fn matches(&self, item: &CatalogItem) -> bool {
        item.material_type
            .as_deref()
            .map(|t| t.trim().eq_ignore_ascii_case(&self.material_type))
            .unwrap_or(true)
    }
}
