//! Version management layer for go toolchains
//!
//! This module knows how versions are ordered, where installable archives
//! come from, and how they end up on disk.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Catalog   │────▶│    Cache    │     │  Installer  │
//! │  (fetch)    │     │  (storage)  │     │ (download)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │    Order    │                         │  Installed  │
//! │(version cmp)│                         │ (inventory) │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Expiring blob cache indexed in SQLite
//! - [`catalog`]: Remote catalog of installable archives
//! - [`error`]: Error types for every operation in this layer
//! - [`installed`]: Inventory of the versions directory
//! - [`installer`]: Downloads, verifies and unpacks archives
//! - [`order`]: Version ordering and prefix matching

pub mod cache;
pub mod catalog;
pub mod error;
pub mod installed;
pub mod installer;
pub mod order;

pub use order::Version;
