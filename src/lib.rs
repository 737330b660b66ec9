//! # library-sort Library
//!
//! Sorts the top-level `book` entries of an XML library catalog by their `path`
//! attribute and cross-checks the result with an independent text scan of both
//! files.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod sorter;
pub mod verifier;

pub use catalog::{BookEntry, Catalog, CatalogNode};
pub use config::{Config, ConfigManager, EnvProvider, FileConfig, OutputConfig, SystemEnvProvider};
pub use error::{CatalogError, ConfigError, SortError, VerifyError};
pub use output::{Output, VerbosityLevel};
pub use sorter::{SortSummary, sort, sort_catalog};
pub use verifier::{
    DuplicateId, InputScan, Verification, VerificationReport, verify, verify_catalog,
};
