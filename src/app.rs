//! Wiring from [`AppConfig`] to a ready [`AppState`]

use crate::config::AppConfig;
use matrec_api::AppState;
use matrec_core::Result;
use matrec_similarity::{CosineRanker, Engines, LevelRanker};
use matrec_storage::{CatalogStore, EncoderBundle};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the store and engines described by `config`.
///
/// A configured encoder artifact that cannot be loaded is an error.
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    config.validate()?;
    let store = config.catalog_store();
    let mut engines = Engines::new(LevelRanker::new(config.levels.clone()));

    if let Some(path) = config.artifact_path() {
        engines = engines.with_cosine(load_cosine(&store, &path)?);
    }

    info!(
        catalogs = store.ids().len(),
        strategies = ?engines.available(),
        default_strategy = %config.default_strategy,
        "engine ready"
    );
    Ok(AppState::new(Arc::new(store), Arc::new(engines)).with_default_strategy(config.default_strategy))
}

/// Load an encoder bundle and reconcile its reference catalog with the store.
///
/// The returned ranker only serves the bundle's catalog. When the store
/// already serves a catalog with that id, the stored encoding is reused only
/// if the rows are identical; otherwise the catalog is encoded again on first
/// use. A bundle whose catalog the store does not know is added to the store
/// as-is.
pub fn load_cosine(store: &CatalogStore, path: &Path) -> Result<CosineRanker> {
    let bundle = EncoderBundle::load(path)?;
    let (encoder, reference, encoded) = bundle.into_parts()?;
    let ranker = CosineRanker::new(Arc::new(encoder));

    let Some(id) = store.resolve_id(reference.id()) else {
        info!(catalog = reference.id(), "serving reference catalog from encoder artifact");
        store.insert(reference);
        return Ok(ranker.with_reference(encoded));
    };

    match store.get(&id) {
        Ok(current) if current.items() == reference.items() => Ok(ranker.with_reference(encoded)),
        Ok(_) => {
            warn!(catalog = %id, "catalog differs from encoder artifact reference, re-encoding on first use");
            Ok(ranker.for_catalog(id))
        }
        Err(e) => {
            warn!(catalog = %id, error = %e, "could not compare catalog with encoder artifact reference");
            Ok(ranker.for_catalog(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrec_core::{Attributes, Catalog, CatalogItem, Error, Query};
    use matrec_similarity::{FitOptions, Ranker, Strategy};
    use std::fs;

    const WOOD: &str = "\
Name,Application,Material Type,Strength,Cost,Water Resistance,Durability
Teak,Furniture,Hardwood,High,High,High,High
Pine,Framing,Softwood,Medium,Low,Low,Medium
Plywood,Panels,Engineered,Medium,Medium,Medium,Medium
";

    fn config(dir: &Path) -> AppConfig {
        fs::write(dir.join("wood.csv"), WOOD).unwrap();
        AppConfig::from_json(&format!(
            r#"{{"data_dir": {:?}, "catalogs": {{"Wood": "wood.csv"}}, "encoder_artifact": "wood.mre"}}"#,
            dir.display().to_string()
        ))
        .unwrap()
    }

    #[test]
    fn test_level_only_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.encoder_artifact = None;

        let state = build_state(&config).unwrap();
        assert_eq!(state.engines.available(), vec![Strategy::Level]);
    }

    #[test]
    fn test_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(build_state(&config(dir.path())).is_err());
    }

    #[test]
    fn test_artifact_reference_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let catalog = config.catalog_store().get("Wood").unwrap();
        EncoderBundle::fit(&catalog, FitOptions::default())
            .unwrap()
            .save(dir.path().join("wood.mre"))
            .unwrap();

        let state = build_state(&config).unwrap();
        let cosine = state.engines.cosine().unwrap();
        assert_eq!(cosine.cached_catalogs(), 1);

        let response = state
            .rank("wood", &Query::from_levels("High", "High", "High", "High"), None, Some(Strategy::Cosine))
            .unwrap();
        assert_eq!(response.result[0].name, "Teak");
    }

    #[test]
    fn test_changed_catalog_is_not_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let stale = Catalog::new(
            "Wood",
            vec![CatalogItem::new("Oak", "Flooring", Attributes::uniform("High")).with_material_type("Hardwood")],
        );
        let store = config.catalog_store();
        let bundle = EncoderBundle::fit(&stale, FitOptions::default()).unwrap();
        let path = dir.path().join("stale.mre");
        bundle.save(&path).unwrap();

        let cosine = load_cosine(&store, &path).unwrap();
        assert_eq!(cosine.cached_catalogs(), 0);
        assert_eq!(cosine.catalog_id(), Some("Wood"));

        // Re-encoded from the current rows: only Teak fits the stale vocabulary
        let current = store.get("Wood").unwrap();
        let results = cosine.rank(&current, &Query::from_levels("High", "High", "High", "High"), 3).unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.item.name.as_str()).collect();
        assert_eq!(names, vec!["Teak"]);
    }

    #[test]
    fn test_cosine_rejects_other_catalogs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        fs::write(
            dir.path().join("bricks.csv"),
            "Name,Application,Material Type,Strength,Cost,Water Resistance,Durability\n\
             Clay Brick,Walls,Clay,High,Low,Medium,High\n\
             Fly Ash Brick,Partitions,Fly Ash,Medium,Low,Medium,Medium\n",
        )
        .unwrap();
        config.catalogs.insert("Bricks".to_string(), "bricks.csv".into());

        let catalog = config.catalog_store().get("Wood").unwrap();
        EncoderBundle::fit(&catalog, FitOptions::default())
            .unwrap()
            .save(dir.path().join("wood.mre"))
            .unwrap();

        let state = build_state(&config).unwrap();
        let query = Query::from_levels("High", "Low", "Medium", "High");

        let err = state.rank("Bricks", &query, None, Some(Strategy::Cosine)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("Bricks")));
        assert_eq!(state.rank("Bricks", &query, None, Some(Strategy::Level)).unwrap().result.len(), 2);
    }

    #[test]
    fn test_unknown_reference_catalog_is_added() {
        let dir = tempfile::tempdir().unwrap();
        let glass = Catalog::new(
            "Glass",
            vec![CatalogItem::new("Float Glass", "Windows", Attributes::uniform("Medium"))],
        );
        let path = dir.path().join("glass.mre");
        EncoderBundle::fit(&glass, FitOptions::default())
            .unwrap()
            .save(&path)
            .unwrap();

        let store = CatalogStore::default();
        let cosine = load_cosine(&store, &path).unwrap();
        assert_eq!(cosine.cached_catalogs(), 1);
        assert_eq!(cosine.catalog_id(), Some("Glass"));
        assert_eq!(store.get("Glass").unwrap().len(), 1);
    }
}
