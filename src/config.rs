//! Process configuration
//!
//! Read from a JSON file; every field is optional and falls back to the
//! defaults below.
//!
//! ```json
//! {
//!   "data_dir": "./data",
//!   "catalogs": { "Bricks": "Bricks_products_list_200.csv" },
//!   "levels": { "Low": 3, "Medium": 6, "High": 9 },
//!   "encoder_artifact": "models/bricks.mre",
//!   "default_strategy": "level",
//!   "http_port": 8080
//! }
//! ```

use matrec_core::{Error, LevelMap, Result};
use matrec_similarity::Strategy;
use matrec_storage::CatalogStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// The catalogs shipped with the project, by id
pub const DEFAULT_CATALOGS: [(&str, &str); 7] = [
    ("Bricks", "Bricks_products_list_200.csv"),
    ("Cement", "Cement_Product_List_200_Modified.csv"),
    ("Concrete", "Concrete_Product_List_200_Modified.csv"),
    ("Steel", "Steel_Product_List_200_Modified.csv"),
    ("Wood", "Wood_Product_List_200_Modified.csv"),
    ("Iron", "Iron_Product_List_200_Modified.csv"),
    ("Aggregate", "aggregate_product_list_200.csv"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base directory for relative catalog and artifact paths
    pub data_dir: PathBuf,
    /// Catalog id -> CSV file
    pub catalogs: BTreeMap<String, PathBuf>,
    pub levels: LevelMap,
    /// Fitted encoder bundle enabling the cosine strategy
    pub encoder_artifact: Option<PathBuf>,
    pub default_strategy: Strategy,
    pub http_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            catalogs: DEFAULT_CATALOGS
                .iter()
                .map(|(id, file)| (id.to_string(), PathBuf::from(file)))
                .collect(),
            levels: LevelMap::default(),
            encoder_artifact: None,
            default_strategy: Strategy::default(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.levels.validate()?;
        if let Some(id) = self.catalogs.keys().find(|id| id.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!("blank catalog id '{}'", id)));
        }
        Ok(())
    }

    /// Resolve a path against `data_dir` unless it is absolute
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn catalog_sources(&self) -> Vec<(String, PathBuf)> {
        self.catalogs
            .iter()
            .map(|(id, path)| (id.clone(), self.resolve(path)))
            .collect()
    }

    pub fn artifact_path(&self) -> Option<PathBuf> {
        self.encoder_artifact.as_deref().map(|p| self.resolve(p))
    }

    pub fn catalog_store(&self) -> CatalogStore {
        CatalogStore::new(self.catalog_sources())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.catalogs.len(), 7);
        assert_eq!(config.levels.get("Medium"), Some(6.0));
        assert_eq!(config.default_strategy, Strategy::Level);
        assert_eq!(
            config.catalogs.get("Aggregate").map(PathBuf::as_path),
            Some(Path::new("aggregate_product_list_200.csv"))
        );
    }

    #[test]
    fn test_partial_json() {
        let config = AppConfig::from_json(
            r#"{"data_dir": "/srv/matrec", "levels": {"Low": 1, "High": 10}, "default_strategy": "cosine"}"#,
        )
        .unwrap();

        assert_eq!(config.levels.get("High"), Some(10.0));
        assert_eq!(config.levels.get("Medium"), None);
        assert_eq!(config.default_strategy, Strategy::Cosine);
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.catalogs.len(), 7);
    }

    #[test]
    fn test_path_resolution() {
        let config = AppConfig::from_json(
            r#"{"data_dir": "/srv/matrec", "catalogs": {"Glass": "glass.csv", "Tile": "/opt/tile.csv"},
                "encoder_artifact": "models/glass.mre"}"#,
        )
        .unwrap();

        let sources = config.catalog_sources();
        assert_eq!(sources[0], ("Glass".to_string(), PathBuf::from("/srv/matrec/glass.csv")));
        assert_eq!(sources[1], ("Tile".to_string(), PathBuf::from("/opt/tile.csv")));
        assert_eq!(config.artifact_path(), Some(PathBuf::from("/srv/matrec/models/glass.mre")));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(AppConfig::from_json("{"), Err(Error::InvalidConfig(_))));
        assert!(matches!(
            AppConfig::from_json(r#"{"default_strategy": "fastest"}"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(AppConfig::from_json(r#"{"levels": {}}"#).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrec.json");
        fs::write(&path, r#"{"http_port": 9000}"#).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap().http_port, 9000);
        assert!(AppConfig::load(dir.path().join("missing.json")).is_err());
    }
}
