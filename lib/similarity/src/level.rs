//! Level-mapping scorer
//!
//! Resolves each attribute to a point on the level scale and scores a row by
//! its negative Manhattan distance to the query in 4-D attribute space. An
//! exact match scores 0, the best possible value.

use crate::rank::{RankedResult, Ranker};
use matrec_core::{Attribute, Catalog, Error, Filter, LevelMap, Query, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Number of results returned when the caller does not ask for a count
pub const DEFAULT_LEVEL_TOP_K: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct LevelRanker {
    levels: LevelMap,
}

impl LevelRanker {
    pub fn new(levels: LevelMap) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &LevelMap {
        &self.levels
    }

    /// Resolve the query profile, failing on any attribute the map lacks
    pub fn resolve_query(&self, query: &Query) -> Result<[f32; 4]> {
        let mut target = [0.0f32; 4];
        for (slot, (attribute, value)) in target.iter_mut().zip(query.attributes.iter()) {
            *slot = self.levels.resolve(value).ok_or_else(|| {
                Error::InvalidQuery(format!(
                    "{} value '{}' has no level mapping",
                    attribute, value
                ))
            })?;
        }
        Ok(target)
    }
}

impl Ranker for LevelRanker {
    fn name(&self) -> &'static str {
        "level"
    }

    fn default_top_k(&self) -> usize {
        DEFAULT_LEVEL_TOP_K
    }

    fn score_all(&self, catalog: &Catalog, query: &Query) -> Result<Vec<RankedResult>> {
        let target = self.resolve_query(query)?;
        let filter = query.filter();
        let filter = filter.as_ref().map(|f| f as &dyn Filter);

        let mut results = Vec::with_capacity(catalog.len());
        let mut excluded = 0usize;

        for (position, item) in catalog.candidates(filter) {
            let Some(values) = self.levels.resolve_all(&item.attributes) else {
                excluded += 1;
                debug!(catalog = catalog.id(), item = %item.name, position, "row has an unmapped attribute, skipped");
                continue;
            };

            let mut contributions = BTreeMap::new();
            let mut distance = 0.0f32;
            for ((attribute, row), wanted) in Attribute::ALL.into_iter().zip(values).zip(target) {
                let diff = (row - wanted).abs();
                distance += diff;
                contributions.insert(attribute.key().to_string(), 0.0 - diff);
            }

            results.push(
                RankedResult::new(item.clone(), position, 0.0 - distance)
                    .with_contributions(contributions),
            );
        }

        debug!(
            catalog = catalog.id(),
            scored = results.len(),
            excluded,
            "level scoring complete"
        );
        Ok(results)
    }
}
