use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version: {0}")]
    Invalid(String),

    #[error("no versions provided")]
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed downloading versions file, unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("version {0} is not available")]
    NotAvailable(String),

    #[error("version {0} is not installed")]
    NotInstalled(String),

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to download {url}, unexpected status: {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("unsupported checksum algorithm: {0}")]
    UnsupportedChecksum(String),

    #[error("failed to download go {version}, checksums don't match")]
    ChecksumMismatch { version: String },

    #[error("unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("archive for go {version} does not contain bin/{tool}")]
    InvalidArchive { version: String, tool: String },

    #[error(
        "unexpected content in version directory {}, remove it manually and try again",
        path.display()
    )]
    Integrity { path: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Zip {
        context: &'static str,
        #[source]
        source: zip::result::ZipError,
    },
}

impl InstallError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn zip(context: &'static str, source: zip::result::ZipError) -> Self {
        Self::Zip { context, source }
    }
}
