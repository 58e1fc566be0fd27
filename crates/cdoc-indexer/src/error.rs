//! Error types for compile-database indexing.
//!
//! # Design
//!
//! - Database and rule errors are detected before any output is touched.
//! - `SourceOutsideTree` is the only per-entry, recoverable variant.
//! - Messages name the offending file, record, or rule on a single line.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for indexer operations.
pub type Result<T> = std::result::Result<T, IndexerError>;

/// Errors raised while turning a compile database into documentation stubs.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// The compile database does not exist at the configured location.
    #[error("compile database not found at {}", path.display())]
    DatabaseNotFound {
        /// Path that was probed.
        path: PathBuf,
    },
    /// The compile database exists but could not be read.
    #[error("failed to read compile database {}", path.display())]
    DatabaseRead {
        /// Database path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The compile database is not valid or a record breaks the schema.
    #[error("malformed compile database {}: {detail}", path.display())]
    MalformedDatabase {
        /// Database path.
        path: PathBuf,
        /// What was wrong, including the record index when known.
        detail: String,
    },
    /// An exclusion rule is not of the form `field=pattern` or names an unknown field.
    #[error("invalid exclusion rule '{rule}': {detail}")]
    InvalidExclusionRule {
        /// Rule text as supplied.
        rule: String,
        /// Why the rule was rejected.
        detail: String,
    },
    /// An exclusion rule carries a regular expression that does not compile.
    #[error("invalid pattern in exclusion rule '{rule}'")]
    InvalidExclusionPattern {
        /// Rule text as supplied.
        rule: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
    /// A source file does not live under the source-location root.
    #[error("{} is outside the source tree {}", source_file.display(), root.display())]
    SourceOutsideTree {
        /// Absolute, normalised source path.
        source_file: PathBuf,
        /// Source-location root it was checked against.
        root: PathBuf,
    },
    /// Creating a directory or writing a generated file failed.
    #[error("failed to write {}", path.display())]
    WriteFailure {
        /// File or directory that could not be written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl IndexerError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::MalformedDatabase {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Whether the error stems from user-supplied configuration rather than the environment.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DatabaseNotFound { .. }
                | Self::MalformedDatabase { .. }
                | Self::InvalidExclusionRule { .. }
                | Self::InvalidExclusionPattern { .. }
        )
    }
}
