use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing the catalog document itself
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{details}")]
    Malformed { details: String },

    #[error("Invalid UTF-8 in markup: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("XML write error: {0}")]
    Write(String),
}

impl CatalogError {
    pub(crate) fn malformed(details: impl Into<String>) -> Self {
        CatalogError::Malformed {
            details: details.into(),
        }
    }
}

/// Failure modes of the sorter
#[derive(Error, Debug)]
pub enum SortError {
    #[error("Input file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("XML parsing error: {path} - {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[source] CatalogError),
}

/// Failure modes of the verifier
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("IO error reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VerifyError {
    /// Classify an I/O failure for `path`, singling out a missing file
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => VerifyError::NotFound { path },
            _ => VerifyError::Read { path, source },
        }
    }
}

/// Configuration-specific error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Sorter result type alias
pub type SortResult<T> = std::result::Result<T, SortError>;

/// Verifier result type alias
pub type VerifyResult<T> = std::result::Result<T, VerifyError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
