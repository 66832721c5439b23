//! Shared ranking contract
//!
//! Every strategy scores the rows of a catalog against a query and returns
//! them best-first. Strategies only differ in how a row's score is computed,
//! so callers can swap them without touching the rendering side.

use matrec_core::{Catalog, CatalogItem, Query, Result};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A catalog row paired with its score against a query
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    /// The matched row
    pub item: CatalogItem,
    /// Position of the row in its catalog
    pub position: usize,
    /// Overall score, higher is closer
    pub score: f32,
    /// Per-feature contributions to `score`
    pub contributions: BTreeMap<String, f32>,
}

impl RankedResult {
    pub fn new(item: CatalogItem, position: usize, score: f32) -> Self {
        Self {
            item,
            position,
            score,
            contributions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_contributions(mut self, contributions: BTreeMap<String, f32>) -> Self {
        self.contributions = contributions;
        self
    }
}

/// A ranking strategy
pub trait Ranker: Send + Sync {
    /// Short strategy name used in logs and responses
    fn name(&self) -> &'static str;

    /// Number of results returned when the caller does not ask for a count
    fn default_top_k(&self) -> usize;

    /// Score every eligible row, in catalog order.
    ///
    /// Rows whose attributes cannot be made comparable are left out rather
    /// than reported as errors.
    fn score_all(&self, catalog: &Catalog, query: &Query) -> Result<Vec<RankedResult>>;

    /// The `top_k` best rows, best first, ties in catalog order
    fn rank(&self, catalog: &Catalog, query: &Query, top_k: usize) -> Result<Vec<RankedResult>> {
        Ok(select_top_k(self.score_all(catalog, query)?, top_k))
    }
}

/// Sort descending by score and keep the first `top_k`.
///
/// The sort is stable, so rows arriving in catalog order keep that order
/// among equal scores. NaN scores sink to the bottom.
pub fn select_top_k(mut results: Vec<RankedResult>, top_k: usize) -> Vec<RankedResult> {
    results.sort_by(|a, b| descending(a.score, b.score));
    results.truncate(top_k);
    results
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrec_core::Attributes;

    fn result(name: &str, position: usize, score: f32) -> RankedResult {
        RankedResult::new(
            CatalogItem::new(name, "test", Attributes::uniform("Low")),
            position,
            score,
        )
    }

    fn names(results: &[RankedResult]) -> Vec<&str> {
        results.iter().map(|r| r.item.name.as_str()).collect()
    }

    #[test]
    fn test_sorted_descending() {
        let results = vec![result("a", 0, -4.0), result("b", 1, 0.0), result("c", 2, -1.0)];
        let top = select_top_k(results, 10);
        assert_eq!(names(&top), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let results = vec![
            result("first", 0, -3.0),
            result("best", 1, 0.0),
            result("second", 2, -3.0),
            result("third", 3, -3.0),
        ];
        let top = select_top_k(results, 10);
        assert_eq!(names(&top), vec!["best", "first", "second", "third"]);
    }

    #[test]
    fn test_truncates_to_k() {
        let results = (0..10).map(|i| result("x", i, i as f32)).collect();
        assert_eq!(select_top_k(results, 3).len(), 3);

        let results = vec![result("only", 0, 1.0)];
        assert_eq!(select_top_k(results, 6).len(), 1);

        let results = vec![result("only", 0, 1.0)];
        assert!(select_top_k(results, 0).is_empty());
    }

    #[test]
    fn test_nan_sinks() {
        let results = vec![result("nan", 0, f32::NAN), result("low", 1, -10.0), result("high", 2, 1.0)];
        let top = select_top_k(results, 3);
        assert_eq!(names(&top), vec!["high", "low", "nan"]);
    }

    #[test]
    fn test_signed_zero_is_a_tie() {
        let results = vec![result("neg", 0, -0.0), result("pos", 1, 0.0)];
        let top = select_top_k(results, 2);
        assert_eq!(names(&top), vec!["neg", "pos"]);
    }
}
