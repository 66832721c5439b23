//! Vector-similarity scorer
//!
//! Catalog rows are encoded once and cached per catalog id; the query is
//! encoded on demand with the same encoder and compared to every cached row
//! by cosine similarity. A cached encoding is only reused for a catalog with
//! the same rows it was built from.

use crate::encoder::{EncodeRecord, Encoder, FeatureSpan};
use crate::rank::{RankedResult, Ranker};
use ahash::{AHashMap, RandomState};
use matrec_core::{AttributeValue, Catalog, Error, Filter, Query, Result, Vector};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Number of results returned when the caller does not ask for a count
pub const DEFAULT_COSINE_TOP_K: usize = 3;

/// Hash of everything an encoder reads from a catalog's rows
fn fingerprint(catalog: &Catalog) -> u64 {
    let mut hasher = RandomState::with_seeds(0x6d61, 0x7472, 0x6563, 0x0001).build_hasher();
    catalog.id().hash(&mut hasher);
    catalog.len().hash(&mut hasher);

    for item in catalog.items() {
        item.material_type.as_deref().hash(&mut hasher);
        for (_, value) in item.attributes.iter() {
            match value {
                AttributeValue::Level(label) => {
                    0u8.hash(&mut hasher);
                    label.hash(&mut hasher);
                }
                AttributeValue::Numeric(n) => {
                    1u8.hash(&mut hasher);
                    n.to_bits().hash(&mut hasher);
                }
                AttributeValue::Missing => 2u8.hash(&mut hasher),
            }
        }
    }
    hasher.finish()
}

/// Encoded rows of one catalog, keyed by catalog position
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCatalog {
    catalog_id: String,
    source_len: usize,
    fingerprint: u64,
    rows: Vec<(usize, Vector)>,
}

impl EncodedCatalog {
    /// Encode every row of `catalog`. Rows the encoder rejects are left out.
    pub fn build(catalog: &Catalog, encoder: &dyn Encoder) -> Self {
        let mut rows = Vec::with_capacity(catalog.len());

        for (position, item) in catalog.items().iter().enumerate() {
            match encoder.encode(&EncodeRecord::from(item)) {
                Ok(vector) => rows.push((position, vector)),
                Err(e) => {
                    debug!(catalog = catalog.id(), item = %item.name, position, error = %e, "row could not be encoded, skipped");
                }
            }
        }

        Self {
            catalog_id: catalog.id().to_string(),
            source_len: catalog.len(),
            fingerprint: fingerprint(catalog),
            rows,
        }
    }

    /// Attach a precomputed matrix to the catalog it was encoded from.
    ///
    /// Fails if any vector has the wrong width or points outside the catalog.
    pub fn from_parts(catalog: &Catalog, dim: usize, rows: Vec<(usize, Vector)>) -> Result<Self> {
        for (position, vector) in &rows {
            if vector.dim() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: vector.dim(),
                });
            }
            if *position >= catalog.len() {
                return Err(Error::InvalidConfig(format!(
                    "encoded row {} is outside a catalog of {} rows",
                    position,
                    catalog.len()
                )));
            }
        }

        Ok(Self {
            catalog_id: catalog.id().to_string(),
            source_len: catalog.len(),
            fingerprint: fingerprint(catalog),
            rows,
        })
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Number of rows that encoded successfully
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[(usize, Vector)] {
        &self.rows
    }

    /// Whether this encoding was produced from the rows of `catalog`
    pub fn matches(&self, catalog: &Catalog) -> bool {
        self.catalog_id == catalog.id()
            && self.source_len == catalog.len()
            && self.fingerprint == fingerprint(catalog)
    }
}

pub struct CosineRanker {
    encoder: Arc<dyn Encoder>,
    spans: Vec<FeatureSpan>,
    /// The only catalog this encoder may rank, when it was fitted on one
    catalog_id: Option<String>,
    encoded: RwLock<AHashMap<String, Arc<EncodedCatalog>>>,
}

impl CosineRanker {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        let spans = encoder.feature_spans();
        Self {
            encoder,
            spans,
            catalog_id: None,
            encoded: RwLock::new(AHashMap::new()),
        }
    }

    /// Refuse to rank any catalog but `catalog_id` (case-insensitive)
    #[must_use]
    pub fn for_catalog(mut self, catalog_id: impl Into<String>) -> Self {
        self.catalog_id = Some(catalog_id.into());
        self
    }

    /// Seed the cache with a precomputed encoding and bind to its catalog
    #[must_use]
    pub fn with_reference(self, reference: EncodedCatalog) -> Self {
        let ranker = self.for_catalog(reference.catalog_id());
        ranker
            .encoded
            .write()
            .insert(reference.catalog_id().to_string(), Arc::new(reference));
        ranker
    }

    pub fn catalog_id(&self) -> Option<&str> {
        self.catalog_id.as_deref()
    }

    fn check_catalog(&self, catalog: &Catalog) -> Result<()> {
        match &self.catalog_id {
            Some(fitted) if !fitted.eq_ignore_ascii_case(catalog.id()) => Err(Error::InvalidConfig(format!(
                "cosine encoder was fitted on catalog '{}' and cannot rank '{}'",
                fitted,
                catalog.id()
            ))),
            _ => Ok(()),
        }
    }

    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    /// Number of catalogs with a cached encoding
    pub fn cached_catalogs(&self) -> usize {
        self.encoded.read().len()
    }

    /// Cached encoding of `catalog`, built on first use
    pub fn encoded(&self, catalog: &Catalog) -> Arc<EncodedCatalog> {
        if let Some(cached) = self.encoded.read().get(catalog.id()) {
            if cached.matches(catalog) {
                debug!(catalog = catalog.id(), "using cached catalog encoding");
                return cached.clone();
            }
        }

        let built = Arc::new(EncodedCatalog::build(catalog, self.encoder.as_ref()));
        debug!(
            catalog = catalog.id(),
            encoded = built.len(),
            skipped = catalog.len() - built.len(),
            "catalog encoded"
        );
        self.encoded
            .write()
            .insert(catalog.id().to_string(), built.clone());
        built
    }

    /// Encode the query, reporting every failure as an encoding error
    pub fn encode_query(&self, query: &Query) -> Result<Vector> {
        let vector = self
            .encoder
            .encode(&EncodeRecord::from(query))
            .map_err(|e| match e {
                Error::Encoding(_) => e,
                other => Error::Encoding(other.to_string()),
            })?;

        if vector.dim() != self.encoder.dim() {
            return Err(Error::Encoding(format!(
                "query encoded to {} features, expected {}",
                vector.dim(),
                self.encoder.dim()
            )));
        }
        Ok(vector)
    }

    fn contributions(&self, query: &Vector, row: &Vector) -> BTreeMap<String, f32> {
        let denom = query.norm() * row.norm();
        self.spans
            .iter()
            .filter(|span| span.range.end <= query.dim() && span.range.end <= row.dim())
            .map(|span| {
                let share = if denom == 0.0 {
                    0.0
                } else {
                    let q = &query.as_slice()[span.range.clone()];
                    let r = &row.as_slice()[span.range.clone()];
                    q.iter().zip(r).map(|(a, b)| a * b).sum::<f32>() / denom
                };
                (span.name.clone(), share)
            })
            .collect()
    }
}

impl std::fmt::Debug for CosineRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosineRanker")
            .field("dim", &self.encoder.dim())
            .field("catalog_id", &self.catalog_id)
            .field("cached_catalogs", &self.cached_catalogs())
            .finish()
    }
}

impl Ranker for CosineRanker {
    fn name(&self) -> &'static str {
        "cosine"
    }

    fn default_top_k(&self) -> usize {
        DEFAULT_COSINE_TOP_K
    }

    fn score_all(&self, catalog: &Catalog, query: &Query) -> Result<Vec<RankedResult>> {
        self.check_catalog(catalog)?;
        let query_vector = self.encode_query(query)?;
        let encoded = self.encoded(catalog);
        let filter = query.filter();

        let results = encoded
            .rows()
            .iter()
            .filter_map(|(position, vector)| {
                let item = catalog.get(*position)?;
                if let Some(f) = &filter {
                    if !f.matches(item) {
                        return None;
                    }
                }
                let score = query_vector.cosine_similarity(vector);
                Some(
                    RankedResult::new(item.clone(), *position, score)
                        .with_contributions(self.contributions(&query_vector, vector)),
                )
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{FitOptions, OneHotEncoder};
    use matrec_core::{Attributes, CatalogItem};

    /// Maps the strength label to a fixed vector, rejects anything else
    struct StubEncoder;

    impl Encoder for StubEncoder {
        fn dim(&self) -> usize {
            2
        }

        fn encode(&self, record: &EncodeRecord<'_>) -> Result<Vector> {
            match record.attributes.strength.to_string().as_str() {
                "Low" => Ok(Vector::new(vec![1.0, 0.0])),
                "Medium" => Ok(Vector::new(vec![1.0, 1.0])),
                "High" => Ok(Vector::new(vec![0.0, 1.0])),
                "Zero" => Ok(Vector::new(vec![0.0, 0.0])),
                "Wide" => Ok(Vector::new(vec![1.0, 0.0, 0.0])),
                other => Err(Error::Encoding(format!("unknown strength '{}'", other))),
            }
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            "Bricks",
            vec![
                CatalogItem::new("Low Brick", "x", Attributes::new("Low", "Low", "Low", "Low")),
                CatalogItem::new("Odd Brick", "x", Attributes::new("Broken", "Low", "Low", "Low")),
                CatalogItem::new("High Brick", "x", Attributes::new("High", "Low", "Low", "Low")),
                CatalogItem::new("Medium Brick", "x", Attributes::new("Medium", "Low", "Low", "Low")),
            ],
        )
    }

    #[test]
    fn test_ranks_by_cosine() {
        let ranker = CosineRanker::new(Arc::new(StubEncoder));
        let query = Query::from_levels("Low", "Low", "Low", "Low");

        let results = ranker.rank(&catalog(), &query, 3).unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.item.name.as_str()).collect();
        assert_eq!(names, vec!["Low Brick", "Medium Brick", "High Brick"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!((results[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert_eq!(results[2].score, 0.0);
    }

    #[test]
    fn test_unencodable_rows_are_excluded() {
        let ranker = CosineRanker::new(Arc::new(StubEncoder));
        let query = Query::from_levels("Medium", "Low", "Low", "Low");

        let results = ranker.rank(&catalog(), &query, 10).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.item.name != "Odd Brick"));
    }

    #[test]
    fn test_zero_norm_query_scores_zero() {
        let ranker = CosineRanker::new(Arc::new(StubEncoder));
        let query = Query::from_levels("Zero", "Low", "Low", "Low");

        let results = ranker.rank(&catalog(), &query, 10).unwrap();
        assert_eq!(results.len(), 3);
        for r in &results {
            assert_eq!(r.score, 0.0);
            assert!(!r.score.is_nan());
        }
        // All tied, so catalog order survives
        let positions: Vec<usize> = results.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 2, 3]);
    }

    #[test]
    fn test_query_encoding_failure_is_reported() {
        let ranker = CosineRanker::new(Arc::new(StubEncoder));
        let query = Query::from_levels("Granite", "Low", "Low", "Low");

        let err = ranker.rank(&catalog(), &query, 3).unwrap_err();
        assert!(matches!(err, Error::Encoding(ref msg) if msg.contains("Granite")));
    }

    #[test]
    fn test_query_shape_mismatch_is_reported() {
        let ranker = CosineRanker::new(Arc::new(StubEncoder));
        let query = Query::from_levels("Wide", "Low", "Low", "Low");

        assert!(matches!(
            ranker.rank(&catalog(), &query, 3),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn test_catalog_encoded_once() {
        let ranker = CosineRanker::new(Arc::new(StubEncoder));
        let catalog = catalog();
        let query = Query::from_levels("Low", "Low", "Low", "Low");

        let first = ranker.encoded(&catalog);
        ranker.rank(&catalog, &query, 3).unwrap();
        let second = ranker.encoded(&catalog);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(ranker.cached_catalogs(), 1);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_with_reference_is_used() {
        let catalog = catalog();
        let reference = EncodedCatalog::from_parts(
            &catalog,
            2,
            vec![(2, Vector::new(vec![1.0, 0.0]))],
        )
        .unwrap();
        let ranker = CosineRanker::new(Arc::new(StubEncoder)).with_reference(reference);
        let query = Query::from_levels("Low", "Low", "Low", "Low");

        // Only the precomputed row exists, and it carries the reference vector
        let results = ranker.rank(&catalog, &query, 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.name, "High Brick");
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_parts_validates() {
        let catalog = catalog();
        assert!(matches!(
            EncodedCatalog::from_parts(&catalog, 3, vec![(0, Vector::new(vec![0.0; 2]))]),
            Err(Error::InvalidDimension { expected: 3, actual: 2 })
        ));
        assert!(EncodedCatalog::from_parts(&catalog, 2, vec![(5, Vector::new(vec![0.0; 2]))]).is_err());
    }

    fn two_rows(id: &str, first: &str, second: &str) -> Catalog {
        Catalog::new(
            id,
            vec![
                CatalogItem::new("First", "x", Attributes::uniform(first)),
                CatalogItem::new("Second", "x", Attributes::uniform(second)),
            ],
        )
    }

    #[test]
    fn test_same_id_and_length_with_new_rows_is_re_encoded() {
        let original = two_rows("Bricks", "Low", "High");
        let encoder = OneHotEncoder::fit(original.items(), FitOptions::default()).unwrap();
        let ranker = CosineRanker::new(Arc::new(encoder));
        let query = Query::from_levels("High", "High", "High", "High");

        let results = ranker.rank(&original, &query, 2).unwrap();
        assert_eq!(results[0].item.name, "Second");
        assert!((results[0].score - 1.0).abs() < 1e-6);

        let replaced = two_rows("Bricks", "Low", "Low");
        assert!(!ranker.encoded(&original).matches(&replaced));

        let results = ranker.rank(&replaced, &query, 2).unwrap();
        let scored: Vec<(usize, f32)> = results.iter().map(|r| (r.position, r.score)).collect();
        assert_eq!(scored, vec![(0, 0.0), (1, 0.0)]);
    }

    #[test]
    fn test_bound_ranker_rejects_other_catalogs() {
        let wood = two_rows("Wood", "Low", "High");
        let encoder = OneHotEncoder::fit(wood.items(), FitOptions::default()).unwrap();
        let ranker = CosineRanker::new(Arc::new(encoder)).for_catalog("Wood");
        let query = Query::from_levels("Low", "Low", "Low", "Low");

        assert_eq!(ranker.rank(&two_rows("wood", "Low", "High"), &query, 3).unwrap().len(), 2);

        let err = ranker.rank(&two_rows("Bricks", "Low", "High"), &query, 3).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("Wood") && msg.contains("Bricks")));
        assert_eq!(ranker.cached_catalogs(), 1);
    }

    #[test]
    fn test_with_reference_binds_catalog() {
        let wood = two_rows("Wood", "Low", "High");
        let reference = EncodedCatalog::from_parts(&wood, 2, vec![(0, Vector::new(vec![1.0, 0.0]))]).unwrap();
        let ranker = CosineRanker::new(Arc::new(StubEncoder)).with_reference(reference);

        assert_eq!(ranker.catalog_id(), Some("Wood"));
        assert!(ranker.rank(&catalog(), &Query::from_levels("Low", "Low", "Low", "Low"), 3).is_err());
    }

    #[test]
    fn test_one_hot_contributions_sum_to_score() {
        let items = vec![
            CatalogItem::new("A", "x", Attributes::new("Low", "Low", "High", "Medium")),
            CatalogItem::new("B", "x", Attributes::new("High", "Low", "Low", "Medium")),
        ];
        let catalog = Catalog::new("Cement", items.clone());
        let encoder = OneHotEncoder::fit(&items, FitOptions::default()).unwrap();
        let ranker = CosineRanker::new(Arc::new(encoder));
        let query = Query::from_levels("Low", "Low", "Low", "Medium");

        let results = ranker.rank(&catalog, &query, 2).unwrap();
        for r in &results {
            let total: f32 = r.contributions.values().sum();
            assert!((total - r.score).abs() < 1e-5);
        }
        // A shares strength, cost and durability; B shares cost, water and durability
        assert!((results[0].score - 0.75).abs() < 1e-6);
        assert!((results[1].score - 0.75).abs() < 1e-6);
        assert_eq!(results[0].item.name, "A");
    }
}
