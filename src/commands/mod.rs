//! Command handlers behind the `gowrap` CLI and the wrapper binaries
//!
//! # Modules
//!
//! - [`install`]: `install <version-or-prefix>`
//! - [`uninstall`]: `uninstall <version>`
//! - [`list`]: `list available` and `list installed`
//! - [`configure`]: `configure default|autoinstall|upgrades|selfupgrade`
//! - [`project`]: `project pin|unpin|version`
//! - [`exec`]: Running a wrapped command with the resolved version

pub mod configure;
pub mod exec;
pub mod install;
pub mod list;
pub mod project;
pub mod uninstall;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tracing::warn;

use crate::config::{Configuration, Paths};
use crate::resolve::{Prompt, StdinPrompt};
use crate::version::cache::Cache;
use crate::version::catalog::{CatalogProvider, RemoteCatalog};
use crate::version::installed::VersionsDir;
use crate::version::installer::{ArchiveInstaller, Installer};
use crate::version::order::Version;

/// Everything a command needs for one invocation
pub struct Context {
    pub paths: Paths,
    pub working_dir: PathBuf,
    /// Loaded once at startup
    pub config: Configuration,
    pub catalog: Arc<dyn CatalogProvider>,
    pub installer: Arc<dyn Installer>,
    pub prompt: Arc<dyn Prompt>,
}

impl Context {
    /// Builds the production context: remote catalog backed by the cache,
    /// archive installer and terminal prompt.
    pub fn from_paths(paths: Paths, working_dir: PathBuf) -> anyhow::Result<Self> {
        let cache = match Cache::new(&paths.cache_dir) {
            Ok(cache) => Some(Arc::new(cache)),
            Err(e) => {
                warn!("Cache unavailable, catalog will not be cached: {}", e);
                None
            }
        };

        let catalog: Arc<dyn CatalogProvider> =
            Arc::new(RemoteCatalog::new(&paths.versions_url, cache));
        let installer = Arc::new(ArchiveInstaller::new(
            VersionsDir::new(paths.versions_dir()),
            catalog.clone(),
        ));

        Self::new(paths, working_dir, catalog, installer, Arc::new(StdinPrompt))
    }

    pub fn new(
        paths: Paths,
        working_dir: PathBuf,
        catalog: Arc<dyn CatalogProvider>,
        installer: Arc<dyn Installer>,
        prompt: Arc<dyn Prompt>,
    ) -> anyhow::Result<Self> {
        let config = paths
            .config_store()
            .load()
            .context("failed to load configuration")?;

        Ok(Self {
            paths,
            working_dir,
            config,
            catalog,
            installer,
            prompt,
        })
    }

    /// Directory above which no project is looked for
    pub fn project_ceiling(&self) -> Option<&Path> {
        self.paths.project_ceiling.as_deref()
    }

    pub fn versions_dir(&self) -> VersionsDir {
        VersionsDir::new(self.paths.versions_dir())
    }

    pub fn installed_versions(&self) -> anyhow::Result<Vec<Version>> {
        self.versions_dir()
            .list_installed()
            .context("failed to list installed versions")
    }
}

/// Parses a version given on the command line
pub(crate) fn parse_version(raw: &str) -> anyhow::Result<Version> {
    raw.parse::<Version>()
        .with_context(|| format!("invalid version provided: {}", raw))
}
