//! Remote catalog of installable go archives
//!
//! The catalog is a JSON document mapping every go release to its archives
//! for all platforms. Only archives for the running platform are kept, and
//! that filtered view is what gets cached locally.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::{APP_NAME, CATALOG_TTL, FETCH_TIMEOUT};
use crate::version::cache::Cache;
use crate::version::error::CatalogError;
use crate::version::order::{self, Version};

/// Cache key of the platform-filtered catalog
const CATALOG_CACHE_PREFIX: &str = "catalog";

/// Where to download one release archive from and how to verify it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveDescriptor {
    pub url: String,
    pub checksum: String,
    pub checksum_algorithm: String,
}

/// Installable versions for the running platform, keyed by full version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    archives: HashMap<Version, ArchiveDescriptor>,
}

impl Catalog {
    pub fn new(archives: HashMap<Version, ArchiveDescriptor>) -> Self {
        Self { archives }
    }

    pub fn get(&self, version: &Version) -> Option<&ArchiveDescriptor> {
        self.archives.get(version)
    }

    /// All versions, in no particular order
    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.archives.keys()
    }

    /// Latest version having `prefix`, where `None` matches every version
    pub fn latest_for_prefix(&self, prefix: Option<&Version>) -> Option<&Version> {
        order::latest_with_prefix(self.archives.keys(), prefix)
    }

    fn from_wire(wire: HashMap<String, ArchiveDescriptor>) -> Self {
        let archives = wire
            .into_iter()
            .filter_map(|(version, archive)| match version.parse::<Version>() {
                Ok(version) => Some((version.to_full(), archive)),
                Err(_) => {
                    warn!("Ignoring catalog entry with invalid version {:?}", version);
                    None
                }
            })
            .collect();
        Self { archives }
    }

    fn to_wire(&self) -> HashMap<String, &ArchiveDescriptor> {
        self.archives
            .iter()
            .map(|(version, archive)| (version.to_string(), archive))
            .collect()
    }
}

/// Source of the installable versions catalog
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn load_catalog(&self) -> Result<Catalog, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct PlatformArchive {
    #[serde(flatten)]
    archive: ArchiveDescriptor,
    #[serde(default)]
    os: String,
    #[serde(default)]
    arch: String,
}

/// Catalog downloaded over HTTP and cached for [`CATALOG_TTL`]
pub struct RemoteCatalog {
    client: reqwest::Client,
    url: String,
    cache: Option<Arc<Cache>>,
    os: String,
    arch: String,
}

impl RemoteCatalog {
    pub fn new(url: &str, cache: Option<Arc<Cache>>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(APP_NAME)
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            url: url.to_string(),
            cache,
            os: go_os(std::env::consts::OS).to_string(),
            arch: go_arch(std::env::consts::ARCH).to_string(),
        }
    }

    /// Overrides the platform used to filter archives
    pub fn with_platform(mut self, os: &str, arch: &str) -> Self {
        self.os = os.to_string();
        self.arch = arch.to_string();
        self
    }

    /// One cache entry per catalog URL and platform, since the cached
    /// catalog only keeps the archives of a single platform
    fn cache_key(&self) -> String {
        format!(
            "{}-{}-{}-{:x}.json",
            CATALOG_CACHE_PREFIX,
            self.os,
            self.arch,
            Sha256::digest(self.url.as_bytes())
        )
    }

    fn load_cached(&self) -> Option<Catalog> {
        let cache = self.cache.as_ref()?;
        let content = match cache.get(&self.cache_key()) {
            Ok(content) => content?,
            Err(e) => {
                warn!("Failed to read cached catalog: {}", e);
                return None;
            }
        };

        match serde_json::from_slice::<HashMap<String, ArchiveDescriptor>>(&content) {
            Ok(wire) => {
                debug!("Using cached catalog");
                Some(Catalog::from_wire(wire))
            }
            Err(e) => {
                warn!("Ignoring malformed cached catalog: {}", e);
                None
            }
        }
    }

    fn store_cached(&self, catalog: &Catalog) {
        let Some(cache) = &self.cache else {
            return;
        };

        let content = match serde_json::to_vec(&catalog.to_wire()) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to serialize catalog for caching: {}", e);
                return;
            }
        };

        if let Err(e) = cache.set(&self.cache_key(), &content, CATALOG_TTL) {
            warn!("Failed to store catalog in cache: {}", e);
        }
    }

    async fn download(&self) -> Result<Catalog, CatalogError> {
        debug!("Downloading catalog from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::UnexpectedStatus(status.as_u16()));
        }

        let releases = response
            .json::<HashMap<String, Vec<PlatformArchive>>>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        let wire = releases
            .into_iter()
            .filter_map(|(version, archives)| {
                archives
                    .into_iter()
                    .find(|a| a.os == self.os && a.arch == self.arch)
                    .map(|a| (version, a.archive))
            })
            .collect();

        Ok(Catalog::from_wire(wire))
    }
}

#[async_trait::async_trait]
impl CatalogProvider for RemoteCatalog {
    async fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        if let Some(catalog) = self.load_cached() {
            return Ok(catalog);
        }

        let catalog = self.download().await?;
        self.store_cached(&catalog);
        Ok(catalog)
    }
}

/// Maps a Rust target OS name to the naming used by go archives
fn go_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Maps a Rust target architecture name to the naming used by go archives
fn go_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "arm" => "armv6l",
        "powerpc64" => "ppc64",
        other => other,
    }
}
