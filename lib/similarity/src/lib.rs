//! # matrec Similarity
//!
//! Ranking strategies for material catalogs.
//!
//! ## Strategies
//!
//! - **Level mapping** ([`LevelRanker`]): categorical levels are mapped to a
//!   numeric scale and rows are scored by negative Manhattan distance to the
//!   query. Default top-k is 6.
//! - **Vector similarity** ([`CosineRanker`]): rows and query are encoded by a
//!   pre-fitted [`Encoder`] and scored by cosine similarity. Default top-k is 3.
//!
//! Both implement [`Ranker`] and produce [`RankedResult`]s, so they are
//! interchangeable.
//!
//! ## Example
//!
//! ```rust
//! use matrec_core::{Attributes, Catalog, CatalogItem, Query};
//! use matrec_similarity::{LevelRanker, Ranker};
//!
//! let catalog = Catalog::new(
//!     "Bricks",
//!     vec![
//!         CatalogItem::new("Clay Brick", "Walls", Attributes::uniform("Low")),
//!         CatalogItem::new("Fly Ash Brick", "Partitions", Attributes::uniform("Medium")),
//!     ],
//! );
//! let query = Query::from_levels("Medium", "Medium", "Medium", "Medium");
//!
//! let ranker = LevelRanker::default();
//! let results = ranker.rank(&catalog, &query, ranker.default_top_k()).unwrap();
//! assert_eq!(results[0].item.name, "Fly Ash Brick");
//! assert_eq!(results[0].score, 0.0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │  LevelMap   │────>│ LevelRanker │──────────┐
//! └─────────────┘     └─────────────┘          │
//!                                              v
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Encoder   │────>│CosineRanker │────>│select_top_k │
//! │ (record→v)  │     │ (cached rows)│    └─────────────┘
//! └─────────────┘     └─────────────┘          │
//!                                       ┌─────────────┐
//!                                       │   Explain   │
//!                                       └─────────────┘
//! ```

pub mod cosine;
pub mod encoder;
pub mod explain;
pub mod level;
pub mod rank;
pub mod strategy;

pub use cosine::{CosineRanker, EncodedCatalog, DEFAULT_COSINE_TOP_K};
pub use encoder::{
    Column, ColumnKind, EncodeRecord, EncodedColumn, Encoder, FeatureSpan, FitOptions,
    OneHotEncoder,
};
pub use explain::{ExplainedResult, RankResponse, RankingStats};
pub use level::{LevelRanker, DEFAULT_LEVEL_TOP_K};
pub use rank::{select_top_k, RankedResult, Ranker};
pub use strategy::{Engines, Strategy};
