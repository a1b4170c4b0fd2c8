//! Installed versions under `$GOWRAP_HOME/versions`

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::TOOL_NAME;
use crate::version::error::InstallError;
use crate::version::order::Version;

/// State of the directory reserved for one version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Installed,
    Missing,
    /// The directory exists but holds no `bin/go`
    Foreign,
}

#[derive(Debug, Clone)]
pub struct VersionsDir {
    root: PathBuf,
}

impl VersionsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, version: &Version) -> PathBuf {
        self.root.join(version.to_string())
    }

    /// Path of `command` inside the `bin` directory of an installed version
    pub fn binary_path(&self, version: &Version, command: &str) -> PathBuf {
        self.version_dir(version)
            .join("bin")
            .join(format!("{}{}", command, std::env::consts::EXE_SUFFIX))
    }

    pub fn status(&self, version: &Version) -> InstallStatus {
        let dir = self.version_dir(version);
        if !dir.exists() {
            InstallStatus::Missing
        } else if self.binary_path(version, TOOL_NAME).is_file() {
            InstallStatus::Installed
        } else {
            InstallStatus::Foreign
        }
    }

    /// Lists installed full versions, in no particular order.
    ///
    /// Entries that are not a full version name or have no `bin/go` are
    /// skipped. A missing versions directory means nothing is installed.
    pub fn list_installed(&self) -> Result<Vec<Version>, InstallError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(InstallError::io(
                    format!("failed to read {}", self.root.display()),
                    e,
                ));
            }
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                InstallError::io(format!("failed to read {}", self.root.display()), e)
            })?;
            let name = entry.file_name();
            let Some(version) = name
                .to_str()
                .and_then(|name| name.parse::<Version>().ok())
                .filter(Version::is_full)
            else {
                debug!("Skipping {:?} in versions directory", name);
                continue;
            };

            match self.status(&version) {
                InstallStatus::Installed => versions.push(version),
                _ => warn!(
                    "Ignoring {} in versions directory, it has no bin/{}",
                    version, TOOL_NAME
                ),
            }
        }

        Ok(versions)
    }

    pub fn uninstall(&self, version: &Version) -> Result<(), InstallError> {
        let dir = self.version_dir(version);
        if !dir.is_dir() {
            return Err(InstallError::NotInstalled(version.to_string()));
        }

        std::fs::remove_dir_all(&dir)
            .map_err(|e| InstallError::io(format!("failed to remove {}", dir.display()), e))?;

        info!("Uninstalled go {}", version);
        Ok(())
    }
}
