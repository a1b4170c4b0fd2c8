//! Project detection
//!
//! # Modules
//!
//! - [`locator`]: Finds the nearest project root
//! - [`declaration`]: Reads the pinned or required go version
//! - [`pin`]: Writes and removes the pin file
//! - [`error`]: Error types for project operations

pub mod declaration;
pub mod error;
pub mod locator;
pub mod pin;

pub use declaration::{Declaration, DeclarationSource, find_declared_version};
pub use error::{ParseError, ProjectError};
pub use locator::{find_project_root, find_project_root_within};
