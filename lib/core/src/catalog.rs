use crate::{CatalogItem, Filter};
use std::collections::BTreeSet;

/// An immutable, in-memory set of products for one material category
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    id: String,
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(id: impl Into<String>, items: Vec<CatalogItem>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&CatalogItem> {
        self.items.get(position)
    }

    /// Rows passing `filter`, paired with their catalog position
    pub fn candidates<'a>(
        &'a self,
        filter: Option<&'a dyn Filter>,
    ) -> impl Iterator<Item = (usize, &'a CatalogItem)> + 'a {
        self.items
            .iter()
            .enumerate()
            .filter(move |(_, item)| filter.map(|f| f.matches(item)).unwrap_or(true))
    }

    /// Distinct material types present, sorted
    pub fn material_types(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.material_type.as_deref())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
