//! Explainability for ranking results
//!
//! Caller-facing output structures: each returned row carries its display
//! fields, its score and a per-feature breakdown of that score.

use crate::rank::RankedResult;
use crate::strategy::Strategy;
use serde::Serialize;
use std::collections::BTreeMap;

/// A ranked row ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedResult {
    /// 1-based rank
    pub rank: usize,
    pub name: String,
    pub application: String,
    pub eco_friendly: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_type: Option<String>,
    /// Source columns beyond the standard ones
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    pub score: f32,
    /// Per-feature contributions to `score`
    pub explain: BTreeMap<String, f32>,
}

impl ExplainedResult {
    pub fn from_ranked(rank: usize, ranked: RankedResult) -> Self {
        let item = ranked.item;
        Self {
            rank,
            name: item.name,
            application: item.application,
            eco_friendly: item.eco_friendly,
            material_type: item.material_type,
            extra: item.extra.into_iter().collect(),
            score: ranked.score,
            explain: ranked.contributions,
        }
    }

    pub fn from_ranked_list(ranked_list: Vec<RankedResult>) -> Vec<Self> {
        ranked_list
            .into_iter()
            .enumerate()
            .map(|(i, r)| Self::from_ranked(i + 1, r))
            .collect()
    }
}

/// Response to one ranking request
#[derive(Debug, Clone, Serialize)]
pub struct RankResponse {
    pub catalog: String,
    pub strategy: Strategy,
    pub result: Vec<ExplainedResult>,
    pub stats: RankingStats,
}

impl RankResponse {
    pub fn from_ranked(
        catalog: impl Into<String>,
        strategy: Strategy,
        ranked_list: Vec<RankedResult>,
        candidates_count: usize,
    ) -> Self {
        let stats = RankingStats::compute(&ranked_list, candidates_count);
        Self {
            catalog: catalog.into(),
            strategy,
            result: ExplainedResult::from_ranked_list(ranked_list),
            stats,
        }
    }

    /// True when nothing matched
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

/// Summary statistics for a ranking request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingStats {
    /// Number of rows that could be scored
    pub candidates_count: usize,
    /// Number of results returned
    pub results_count: usize,
    /// Average score of results
    pub avg_score: f32,
    /// Score of best result
    pub best_score: f32,
    /// Feature that contributed most to best result
    pub top_contributing_field: Option<String>,
}

impl RankingStats {
    /// Compute stats from results sorted best first
    pub fn compute(results: &[RankedResult], candidates_count: usize) -> Self {
        if results.is_empty() {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                top_contributing_field: None,
            };
        }

        let avg_score = results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32;
        let best_score = results[0].score;

        let top_contributing_field = results[0]
            .contributions
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name.clone());

        Self {
            candidates_count,
            results_count: results.len(),
            avg_score,
            best_score,
            top_contributing_field,
        }
    }
}
