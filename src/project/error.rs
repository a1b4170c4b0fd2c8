use std::path::PathBuf;

use thiserror::Error;

/// Error type for go.mod parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("go.mod: missing go directive")]
    MissingGoDirective,

    #[error("go.mod:{line}: repeated go directive")]
    RepeatedGoDirective { line: usize },

    #[error("go.mod:{line}: invalid go version '{version}'")]
    InvalidGoVersion { line: usize, version: String },

    #[error("go.mod:{line}: unterminated block")]
    UnterminatedBlock { line: usize },

    #[error("go.mod:{line}: unexpected ')'")]
    UnexpectedBlockEnd { line: usize },
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid version provided: {0}, 'a.b.c' like version required")]
    PinRequiresFullVersion(String),
}

impl ProjectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
