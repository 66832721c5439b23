//! # matrec Core
//!
//! Core data model for the matrec material recommendation engine.
//!
//! - [`CatalogItem`] - a product row with display fields and four scored attributes
//! - [`Query`] - the attribute profile a user is looking for
//! - [`Catalog`] - an immutable set of rows for one material category
//! - [`LevelMap`] - categorical level to numeric scale lookup
//! - [`Vector`] - dense feature vector with cosine similarity
//!
//! ## Example
//!
//! ```rust
//! use matrec_core::{Attributes, Catalog, CatalogItem, LevelMap, Query};
//!
//! let catalog = Catalog::new(
//!     "Bricks",
//!     vec![CatalogItem::new("Red Clay Brick", "Load-bearing walls", Attributes::uniform("Medium"))],
//! );
//! let query = Query::from_levels("Medium", "Low", "High", "Medium");
//!
//! let levels = LevelMap::default();
//! assert_eq!(levels.resolve_all(&catalog.items()[0].attributes), Some([6.0; 4]));
//! assert!(levels.resolve_all(&query.attributes).is_some());
//! ```

pub mod attribute;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod item;
pub mod level;
pub mod vector;

pub use attribute::{Attribute, AttributeValue, Attributes};
pub use catalog::Catalog;
pub use error::{Error, Result};
pub use filter::{Filter, MaterialTypeFilter};
pub use item::{CatalogItem, Query};
pub use level::LevelMap;
pub use vector::Vector;
