//! Finds the root of the go project containing a directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{MANIFEST_FILE, PIN_FILE};
use crate::project::error::ProjectError;

/// Walks up from `start_dir` to the nearest directory holding a `go.mod` or
/// `.go-version` file. Reaching the filesystem root yields `None`.
pub fn find_project_root(start_dir: &Path) -> Result<Option<PathBuf>, ProjectError> {
    find_project_root_within(start_dir, None)
}

/// Like [`find_project_root`], but stops after checking `ceiling` when the
/// walk reaches it.
pub fn find_project_root_within(
    start_dir: &Path,
    ceiling: Option<&Path>,
) -> Result<Option<PathBuf>, ProjectError> {
    let mut dir = start_dir;
    loop {
        for marker in [MANIFEST_FILE, PIN_FILE] {
            if is_regular_file(&dir.join(marker))? {
                debug!("Found project root {:?} ({})", dir, marker);
                return Ok(Some(dir.to_path_buf()));
            }
        }

        if ceiling == Some(dir) {
            debug!("Reached search ceiling {:?}", dir);
            return Ok(None);
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Ok(None),
        }
    }
}

fn is_regular_file(path: &Path) -> Result<bool, ProjectError> {
    match std::fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ProjectError::io(path, e)),
    }
}
