use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog not found: {0}")]
    CatalogNotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Could not encode record: {0}")]
    Encoding(String),

    #[error("Failed to load {resource}: {reason}")]
    ResourceLoad { resource: String, reason: String },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Build a [`Error::ResourceLoad`] from anything displayable.
    pub fn resource_load(resource: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::ResourceLoad {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}
