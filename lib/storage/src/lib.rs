pub mod artifact;
pub mod csv_loader;
pub mod manager;

pub use artifact::{ArtifactInfo, EncoderBundle, ARTIFACT_FORMAT_VERSION};
pub use csv_loader::{load_catalog, read_catalog};
pub use manager::CatalogStore;
