//! Pinning an exact go version for a project

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::PIN_FILE;
use crate::project::declaration::read_manifest_version;
use crate::project::error::ProjectError;
use crate::project::locator::find_project_root_within;
use crate::version::Version;

/// Writes `version` to the pin file at the project root.
///
/// Returns the pin file path, or `None` (after a warning) when `working_dir`
/// is not inside a project. The project lookup stops at `ceiling`.
pub fn pin_version(
    working_dir: &Path,
    ceiling: Option<&Path>,
    version: &Version,
) -> Result<Option<PathBuf>, ProjectError> {
    if !version.is_full() {
        return Err(ProjectError::PinRequiresFullVersion(version.to_string()));
    }

    let Some(project_root) = find_project_root_within(working_dir, ceiling)? else {
        warn!("Cannot pin version, currently not in a go project");
        return Ok(None);
    };

    if let Some(required) = read_manifest_version(&project_root)?
        && !version.has_prefix(&required)
    {
        warn!(
            "Pinned version ({}) is not compatible with version in go.mod ({})",
            version, required
        );
    }

    let pin_path = project_root.join(PIN_FILE);
    std::fs::write(&pin_path, version.to_string())
        .map_err(|e| ProjectError::io(&pin_path, e))?;

    info!("Pinned go {} in {:?}", version, pin_path);
    Ok(Some(pin_path))
}

/// Removes the pin file of the project containing `working_dir`.
///
/// Returns false (after a warning) when there was nothing to remove.
pub fn unpin_version(working_dir: &Path, ceiling: Option<&Path>) -> Result<bool, ProjectError> {
    let Some(project_root) = find_project_root_within(working_dir, ceiling)? else {
        warn!("Cannot unpin version, currently not in a go project");
        return Ok(false);
    };

    let pin_path = project_root.join(PIN_FILE);
    match std::fs::remove_file(&pin_path) {
        Ok(()) => {
            info!("Removed {:?}", pin_path);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Cannot unpin version, no version pinned for current project");
            Ok(false)
        }
        Err(e) => Err(ProjectError::io(&pin_path, e)),
    }
}
