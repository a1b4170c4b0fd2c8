use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// =============================================================================
// Constants
// =============================================================================

/// How long the downloaded versions catalog stays in the cache (24 hours)
pub const CATALOG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Timeout for fetching the versions catalog (30 seconds)
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default location of the versions catalog
pub const DEFAULT_VERSIONS_URL: &str =
    "https://raw.githubusercontent.com/xabierlaiseca/gowrap/master/data/versions.json";

/// Name of the wrapped toolchain binary, also used to check installs
pub const TOOL_NAME: &str = "go";

/// Name of the management binary
pub const APP_NAME: &str = "gowrap";

/// Project manifest declaring the minimum go version
pub const MANIFEST_FILE: &str = "go.mod";

/// Project pin file holding one exact go version
pub const PIN_FILE: &str = ".go-version";

const CONFIG_FILE: &str = "config.json";
const VERSIONS_DIR: &str = "versions";
const LOG_DIR: &str = "logs";

// =============================================================================
// Policies
// =============================================================================

/// When a version may be installed without being asked for explicitly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AutoInstallPolicy {
    /// Install when nothing suitable is installed, and keep partial
    /// constraints up to date unless `upgrades` says otherwise
    Enabled,
    /// Install only when nothing suitable is installed
    #[default]
    Missing,
    /// Never install automatically
    Disabled,
}

/// Whether a newer version for an already satisfied constraint is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpgradePolicy {
    Auto,
    Ask,
    Disabled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelfUpgradePolicy {
    #[default]
    Enabled,
    Disabled,
}

// =============================================================================
// Configuration
// =============================================================================

/// User preferences persisted in `config.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_version: String,
    pub auto_install: AutoInstallPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrades: Option<UpgradePolicy>,
    pub self_upgrade: SelfUpgradePolicy,
}

impl Configuration {
    /// Upgrade policy in force.
    ///
    /// An explicit `upgrades` value wins. Otherwise `autoinstall enabled`
    /// implies automatic upgrades and anything else disables them.
    pub fn effective_upgrade_policy(&self) -> UpgradePolicy {
        match (self.upgrades, self.auto_install) {
            (Some(policy), _) => policy,
            (None, AutoInstallPolicy::Enabled) => UpgradePolicy::Auto,
            (None, _) => UpgradePolicy::Disabled,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write configuration {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads and saves [`Configuration`] as JSON
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration, falling back to defaults when the file is missing
    pub fn load(&self) -> Result<Configuration, ConfigError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration at {:?}, using defaults", self.path);
                return Ok(Configuration::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&content).map_err(|source| ConfigError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let content = serde_json::to_vec_pretty(config).map_err(|source| {
            ConfigError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, content).map_err(write_err)?;

        debug!("Saved configuration to {:?}", self.path);
        Ok(())
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Locations of everything gowrap keeps on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Tool-private home (`$GOWRAP_HOME` or `~/.gowrap`)
    pub home: PathBuf,
    /// Root of the expiring metadata cache
    pub cache_dir: PathBuf,
    /// URL of the versions catalog
    pub versions_url: String,
    /// Directory above which no project is looked for (`$GOWRAP_CEILING_DIR`)
    pub project_ceiling: Option<PathBuf>,
}

impl Paths {
    /// Resolves paths from the environment
    pub fn from_env() -> Self {
        Self {
            home: home_dir_with_env(std::env::var("GOWRAP_HOME").ok(), dirs::home_dir()),
            cache_dir: cache_dir_with_env(
                std::env::var("XDG_CACHE_HOME").ok(),
                dirs::cache_dir(),
            ),
            versions_url: std::env::var("GOWRAP_VERSIONS_URL")
                .ok()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_VERSIONS_URL.to_string()),
            project_ceiling: std::env::var("GOWRAP_CEILING_DIR")
                .ok()
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Keeps everything under a single root, which is also the project
    /// search ceiling. Used by tests.
    pub fn with_root(root: &Path, versions_url: &str) -> Self {
        Self {
            home: root.join("home"),
            cache_dir: root.join("cache"),
            versions_url: versions_url.to_string(),
            project_ceiling: Some(root.to_path_buf()),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.join(CONFIG_FILE)
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.home.join(VERSIONS_DIR)
    }

    /// Holds the daily rotated `gowrap.<date>.log` files
    pub fn log_dir(&self) -> PathBuf {
        self.home.join(LOG_DIR)
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.config_file())
    }
}

fn home_dir_with_env(gowrap_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    gowrap_home
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".gowrap")))
        .unwrap_or_else(|| PathBuf::from(".gowrap"))
}

fn cache_dir_with_env(xdg_cache_home: Option<String>, cache_dir: Option<PathBuf>) -> PathBuf {
    let cache_dir = xdg_cache_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or(cache_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    cache_dir.join(APP_NAME)
}
