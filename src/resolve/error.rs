use thiserror::Error;

use crate::project::ProjectError;
use crate::version::error::{CatalogError, InstallError, VersionError};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("no suitable version installed for go {0}")]
    NoSuitableVersion(String),

    #[error("no versions available for go {0}")]
    NoVersionsAvailable(String),

    #[error("no go versions installed")]
    NoVersionsInstalled,

    #[error("failed to read answer: {0}")]
    Prompt(#[source] std::io::Error),
}
