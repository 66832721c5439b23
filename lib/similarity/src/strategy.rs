//! Strategy selection
//!
//! Both rankers live side by side in [`Engines`]; a request names the one it
//! wants and gets the same response shape either way.

use crate::cosine::CosineRanker;
use crate::explain::RankResponse;
use crate::level::LevelRanker;
use crate::rank::{select_top_k, Ranker};
use matrec_core::{Catalog, Error, Query, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Level-mapping Manhattan scorer
    #[default]
    Level,
    /// Encoder-based cosine scorer
    Cosine,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Level => "level",
            Strategy::Cosine => "cosine",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "level" | "manual" => Ok(Strategy::Level),
            "cosine" | "vector" => Ok(Strategy::Cosine),
            other => Err(Error::InvalidQuery(format!(
                "unknown strategy '{}', expected 'level' or 'cosine'",
                other
            ))),
        }
    }
}

/// The rankers available to a process
#[derive(Debug, Default)]
pub struct Engines {
    level: LevelRanker,
    cosine: Option<CosineRanker>,
}

impl Engines {
    pub fn new(level: LevelRanker) -> Self {
        Self { level, cosine: None }
    }

    #[must_use]
    pub fn with_cosine(mut self, cosine: CosineRanker) -> Self {
        self.cosine = Some(cosine);
        self
    }

    pub fn level(&self) -> &LevelRanker {
        &self.level
    }

    pub fn cosine(&self) -> Option<&CosineRanker> {
        self.cosine.as_ref()
    }

    /// Strategies that can currently serve requests
    pub fn available(&self) -> Vec<Strategy> {
        let mut strategies = vec![Strategy::Level];
        if self.cosine.is_some() {
            strategies.push(Strategy::Cosine);
        }
        strategies
    }

    pub fn ranker(&self, strategy: Strategy) -> Result<&dyn Ranker> {
        match strategy {
            Strategy::Level => Ok(&self.level),
            Strategy::Cosine => self
                .cosine
                .as_ref()
                .map(|c| c as &dyn Ranker)
                .ok_or_else(|| {
                    Error::InvalidConfig("cosine strategy needs an encoder artifact".into())
                }),
        }
    }

    /// Rank `catalog` against `query` and package the explained response.
    ///
    /// `top_k` falls back to the strategy's default.
    pub fn rank(
        &self,
        strategy: Strategy,
        catalog: &Catalog,
        query: &Query,
        top_k: Option<usize>,
    ) -> Result<RankResponse> {
        let ranker = self.ranker(strategy)?;
        let top_k = top_k.unwrap_or_else(|| ranker.default_top_k());

        let scored = ranker.score_all(catalog, query)?;
        let candidates = scored.len();
        let top = select_top_k(scored, top_k);

        debug!(
            catalog = catalog.id(),
            strategy = ranker.name(),
            candidates,
            returned = top.len(),
            "ranking complete"
        );
        Ok(RankResponse::from_ranked(catalog.id(), strategy, top, candidates))
    }
}
