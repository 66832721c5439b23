//! Encoder artifacts
//!
//! A fitted encoder travels together with the catalog it was fitted on and
//! that catalog's encoded matrix, so a serving process can rank by cosine
//! without refitting. On disk the bundle is bincode, gzip-compressed and
//! wrapped in a small envelope carrying a format version, a timestamp and a
//! SHA-256 of the compressed payload.

use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use matrec_core::{Catalog, CatalogItem, Error, Result, Vector};
use matrec_similarity::{EncodedCatalog, Encoder, FitOptions, OneHotEncoder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    format_version: u32,
    created_at: DateTime<Utc>,
    sha256: String,
    payload: Vec<u8>,
}

/// Summary of a written artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// A fitted encoder plus its reference catalog and encoded rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderBundle {
    pub catalog_id: String,
    pub encoder: OneHotEncoder,
    pub reference: Vec<CatalogItem>,
    /// `(catalog position, features)` for every row that encoded
    pub matrix: Vec<(usize, Vec<f32>)>,
}

impl EncoderBundle {
    /// Fit an encoder on `catalog` and encode its rows
    pub fn fit(catalog: &Catalog, options: FitOptions) -> Result<Self> {
        let encoder = OneHotEncoder::fit(catalog.items(), options)?;
        let encoded = EncodedCatalog::build(catalog, &encoder);

        Ok(Self {
            catalog_id: catalog.id().to_string(),
            reference: catalog.items().to_vec(),
            matrix: encoded
                .rows()
                .iter()
                .map(|(position, v)| (*position, v.as_slice().to_vec()))
                .collect(),
            encoder,
        })
    }

    pub fn dim(&self) -> usize {
        self.encoder.dim()
    }

    /// Write the bundle to `path`, replacing any existing file atomically
    pub fn save(&self, path: impl AsRef<Path>) -> Result<ArtifactInfo> {
        let path = path.as_ref();

        let raw = bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))?;
        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(&raw)?;
        let payload = gz.finish()?;

        let envelope = ArtifactEnvelope {
            format_version: ARTIFACT_FORMAT_VERSION,
            created_at: Utc::now(),
            sha256: format!("{:x}", Sha256::digest(&payload)),
            payload,
        };
        let bytes = bincode::serialize(&envelope).map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        AtomicFile::new(path, AllowOverwrite)
            .write(|f| f.write_all(&bytes))
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        info!(
            catalog = %self.catalog_id,
            path = %path.display(),
            dim = self.dim(),
            rows = self.matrix.len(),
            "encoder artifact written"
        );

        Ok(ArtifactInfo {
            path: path.to_path_buf(),
            size: bytes.len() as u64,
            sha256: envelope.sha256,
            created_at: envelope.created_at,
        })
    }

    /// Read and verify a bundle. Every failure is a resource-load error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let resource = path.display().to_string();
        let fail = |reason: String| Error::resource_load(resource.clone(), reason);

        let bytes = fs::read(path).map_err(|e| fail(e.to_string()))?;
        let envelope: ArtifactEnvelope =
            bincode::deserialize(&bytes).map_err(|e| fail(format!("not an encoder artifact: {}", e)))?;

        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(fail(format!(
                "unsupported artifact version {} (expected {})",
                envelope.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        let digest = format!("{:x}", Sha256::digest(&envelope.payload));
        if digest != envelope.sha256 {
            return Err(fail("checksum mismatch".to_string()));
        }

        let mut raw = Vec::new();
        GzDecoder::new(envelope.payload.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| fail(format!("decompression failed: {}", e)))?;
        let bundle: EncoderBundle =
            bincode::deserialize(&raw).map_err(|e| fail(format!("corrupt payload: {}", e)))?;
        bundle.validate().map_err(|e| fail(e.to_string()))?;

        info!(
            catalog = %bundle.catalog_id,
            path = %path.display(),
            created_at = %envelope.created_at,
            dim = bundle.dim(),
            "encoder artifact loaded"
        );
        Ok(bundle)
    }

    fn validate(&self) -> Result<()> {
        let dim = self.dim();
        for (position, features) in &self.matrix {
            if features.len() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: features.len(),
                });
            }
            if *position >= self.reference.len() {
                return Err(Error::InvalidConfig(format!(
                    "encoded row {} is outside a reference of {} rows",
                    position,
                    self.reference.len()
                )));
            }
        }
        Ok(())
    }

    /// Split into the encoder, the reference catalog and its encoding
    pub fn into_parts(self) -> Result<(OneHotEncoder, Catalog, EncodedCatalog)> {
        let dim = self.dim();
        let rows = self
            .matrix
            .into_iter()
            .map(|(position, features)| (position, Vector::new(features)))
            .collect();

        let catalog = Catalog::new(self.catalog_id, self.reference);
        let encoded = EncodedCatalog::from_parts(&catalog, dim, rows)?;
        Ok((self.encoder, catalog, encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrec_core::{AttributeValue, Attributes};

    fn cement() -> Catalog {
        Catalog::new(
            "Cement",
            vec![
                CatalogItem::new("OPC 53", "High-rise", Attributes::new("High", "Medium", "Medium", "High"))
                    .with_material_type("Portland"),
                CatalogItem::new("PPC", "Plastering", Attributes::new("Medium", "Low", "High", "High"))
                    .with_material_type("Pozzolana"),
                CatalogItem::new("Blank", "Unknown", Attributes::uniform(AttributeValue::Missing)),
                CatalogItem::new("White Cement", "Finishing", Attributes::new("Low", "High", "Medium", "Medium"))
                    .with_material_type("Portland"),
            ],
        )
    }

    #[test]
    fn test_fit_skips_unencodable_rows() {
        let bundle = EncoderBundle::fit(&cement(), FitOptions::default()).unwrap();
        assert_eq!(bundle.reference.len(), 4);
        let positions: Vec<usize> = bundle.matrix.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0, 1, 3]);
        assert!(bundle.matrix.iter().all(|(_, f)| f.len() == bundle.dim()));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("cement.mre");

        let bundle = EncoderBundle::fit(&cement(), FitOptions::default()).unwrap();
        let info = bundle.save(&path).unwrap();
        assert_eq!(info.size, fs::metadata(&path).unwrap().len());
        assert_eq!(info.sha256.len(), 64);

        let loaded = EncoderBundle::load(&path).unwrap();
        assert_eq!(loaded, bundle);

        let (encoder, catalog, encoded) = loaded.into_parts().unwrap();
        assert_eq!(encoder.dim(), bundle.dim());
        assert_eq!(catalog.id(), "Cement");
        assert!(encoded.matches(&catalog));
        assert_eq!(encoded.len(), 3);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cement.mre");
        let bundle = EncoderBundle::fit(&cement(), FitOptions::default()).unwrap();

        bundle.save(&path).unwrap();
        let without = EncoderBundle::fit(&cement(), FitOptions { include_material_type: false }).unwrap();
        without.save(&path).unwrap();

        assert_eq!(EncoderBundle::load(&path).unwrap().dim(), without.dim());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EncoderBundle::load(dir.path().join("absent.mre")).unwrap_err();
        assert!(matches!(err, Error::ResourceLoad { .. }));
    }

    #[test]
    fn test_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mre");
        fs::write(&path, b"definitely not an artifact").unwrap();

        assert!(matches!(
            EncoderBundle::load(&path),
            Err(Error::ResourceLoad { .. })
        ));
    }

    #[test]
    fn test_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cement.mre");
        EncoderBundle::fit(&cement(), FitOptions::default())
            .unwrap()
            .save(&path)
            .unwrap();

        let mut envelope: ArtifactEnvelope = bincode::deserialize(&fs::read(&path).unwrap()).unwrap();
        let last = envelope.payload.len() - 1;
        envelope.payload[last] ^= 0xff;
        fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

        let err = EncoderBundle::load(&path).unwrap_err();
        assert!(matches!(err, Error::ResourceLoad { ref reason, .. } if reason.contains("checksum")));
    }

    #[test]
    fn test_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cement.mre");
        EncoderBundle::fit(&cement(), FitOptions::default())
            .unwrap()
            .save(&path)
            .unwrap();

        let mut envelope: ArtifactEnvelope = bincode::deserialize(&fs::read(&path).unwrap()).unwrap();
        envelope.format_version = ARTIFACT_FORMAT_VERSION + 1;
        fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

        let err = EncoderBundle::load(&path).unwrap_err();
        assert!(matches!(err, Error::ResourceLoad { ref reason, .. } if reason.contains("version")));
    }

    #[test]
    fn test_inconsistent_matrix_rejected() {
        let mut bundle = EncoderBundle::fit(&cement(), FitOptions::default()).unwrap();
        bundle.matrix[0].1.pop();
        assert!(bundle.validate().is_err());

        let mut bundle = EncoderBundle::fit(&cement(), FitOptions::default()).unwrap();
        bundle.matrix[0].0 = 99;
        assert!(bundle.clone().into_parts().is_err());
    }
}
