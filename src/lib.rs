//! # matrec
//!
//! A construction-material recommendation engine. Given a desired profile of
//! strength, cost, water resistance and durability, matrec ranks the products
//! of a material catalog (bricks, cement, steel, ...) by how closely they match.
//!
//! Two interchangeable strategies are available:
//!
//! - **level**: `Low`/`Medium`/`High` are mapped to a numeric scale and rows are
//!   scored by negative Manhattan distance to the query (default top 6)
//! - **cosine**: rows and query are one-hot encoded by a pre-fitted encoder and
//!   scored by cosine similarity (default top 3)
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! matrec --data-dir ./data serve --http-port 8080
//! curl -X POST localhost:8080/catalogs/Bricks/rank \
//!   -H 'content-type: application/json' \
//!   -d '{"query": {"strength": "High", "cost": "Low", "water_resistance": "Medium", "durability": "High"}}'
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use matrec::prelude::*;
//!
//! let catalog = Catalog::new(
//!     "Bricks",
//!     vec![
//!         CatalogItem::new("Clay Brick", "Walls", Attributes::new("Low", "Medium", "Medium", "Medium")),
//!         CatalogItem::new("Fly Ash Brick", "Partitions", Attributes::uniform("Medium")),
//!     ],
//! );
//!
//! let engines = Engines::default();
//! let query = Query::from_levels("Medium", "Medium", "Medium", "Medium");
//! let response = engines.rank(Strategy::Level, &catalog, &query, None).unwrap();
//!
//! assert_eq!(response.result[0].name, "Fly Ash Brick");
//! assert_eq!(response.result[1].score, -3.0);
//! ```
//!
//! ## Crate Structure
//!
//! - `matrec-core` - catalog, query and attribute types, level map, vectors, errors
//! - `matrec-similarity` - rankers, encoder, strategy selection, explanations
//! - `matrec-storage` - CSV loading, catalog cache, encoder artifacts
//! - `matrec-api` - REST API

pub mod app;
pub mod config;

pub use app::{build_state, load_cosine};
pub use config::AppConfig;

// Re-export core types
pub use matrec_core::{
    Attribute, AttributeValue, Attributes,
    Catalog, CatalogItem, Query,
    Filter, MaterialTypeFilter,
    LevelMap, Vector,
    Error, Result,
};

// Re-export ranking
pub use matrec_similarity::{
    CosineRanker, Encoder, Engines, ExplainedResult, FitOptions, LevelRanker, OneHotEncoder,
    RankResponse, RankedResult, Ranker, RankingStats, Strategy,
};

// Re-export storage
pub use matrec_storage::{CatalogStore, EncoderBundle};

// Re-export API
pub use matrec_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Attribute, AttributeValue, Attributes,
        Catalog, CatalogItem, Query,
        LevelMap,
        Error, Result,
        Engines, Ranker, RankResponse, Strategy,
        CatalogStore, EncoderBundle,
        AppConfig, AppState,
    };
}
