//! Reads the go version a project asks for
//!
//! A `.go-version` pin file wins over the `go` directive of `go.mod`.
//!
//! go.mod format handled here:
//! - Directive: `go 1.21`
//! - Blocks, skipped as a whole:
//!   ```text
//!   require (
//!       golang.org/x/text v0.14.0
//!   )
//!   ```

use std::io::ErrorKind;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::config::{MANIFEST_FILE, PIN_FILE};
use crate::project::error::{ParseError, ProjectError};
use crate::version::Version;

/// Where a declared version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationSource {
    PinFile,
    Manifest,
}

/// The version a project root declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub source: DeclarationSource,
    /// Trimmed pin content, or the `major.minor` family of the manifest
    pub version: String,
}

/// Returns the declaration of `project_root`, or `None` when it has neither
/// a pin file nor a manifest.
pub fn find_declared_version(project_root: &Path) -> Result<Option<Declaration>, ProjectError> {
    if let Some(pinned) = read_file(&project_root.join(PIN_FILE))? {
        debug!("Using pinned version {:?}", pinned.trim());
        return Ok(Some(Declaration {
            source: DeclarationSource::PinFile,
            version: pinned.trim().to_string(),
        }));
    }

    Ok(read_manifest_version(project_root)?.map(|version| Declaration {
        source: DeclarationSource::Manifest,
        version: version.to_string(),
    }))
}

/// Returns the `major.minor` family required by the `go.mod` in `project_root`
pub fn read_manifest_version(project_root: &Path) -> Result<Option<Version>, ProjectError> {
    let Some(content) = read_file(&project_root.join(MANIFEST_FILE))? else {
        return Ok(None);
    };

    let version = GoModParser::new().parse(&content)?;
    Ok(Some(version.family()))
}

fn read_file(path: &Path) -> Result<Option<String>, ProjectError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ProjectError::io(path, e)),
    }
}

/// Parser for the `go` directive of go.mod files
pub struct GoModParser {
    /// Regex for the go directive: `go 1.21`
    go_directive_re: Regex,
    /// Regex for a block start: `require (`
    block_start_re: Regex,
}

impl GoModParser {
    pub fn new() -> Self {
        Self {
            go_directive_re: Regex::new(r"^go\s+(\S+)$").unwrap(),
            block_start_re: Regex::new(r"^[A-Za-z]+\s*\($").unwrap(),
        }
    }

    /// Returns the version of the single `go` directive
    pub fn parse(&self, content: &str) -> Result<Version, ParseError> {
        let mut found: Option<Version> = None;
        let mut block_start: Option<usize> = None;

        for (index, line) in content.lines().enumerate() {
            let line_num = index + 1;
            let trimmed = strip_comment(line).trim();

            if trimmed.is_empty() {
                continue;
            }

            if block_start.is_some() {
                if trimmed == ")" {
                    block_start = None;
                }
                continue;
            }

            if trimmed == ")" {
                return Err(ParseError::UnexpectedBlockEnd { line: line_num });
            }

            if self.block_start_re.is_match(trimmed) {
                block_start = Some(line_num);
                continue;
            }

            if let Some(caps) = self.go_directive_re.captures(trimmed) {
                if found.is_some() {
                    return Err(ParseError::RepeatedGoDirective { line: line_num });
                }
                let raw = &caps[1];
                let version = raw
                    .parse::<Version>()
                    .map_err(|_| ParseError::InvalidGoVersion {
                        line: line_num,
                        version: raw.to_string(),
                    })?;
                found = Some(version);
            }
        }

        if let Some(line) = block_start {
            return Err(ParseError::UnterminatedBlock { line });
        }

        found.ok_or(ParseError::MissingGoDirective)
    }
}

impl Default for GoModParser {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once("//").map_or(line, |(code, _)| code)
}
