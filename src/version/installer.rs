//! Downloads, verifies and unpacks go release archives

use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use futures::StreamExt;
#[cfg(test)]
use mockall::automock;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::{APP_NAME, TOOL_NAME};
use crate::version::catalog::{ArchiveDescriptor, CatalogProvider};
use crate::version::error::InstallError;
use crate::version::installed::{InstallStatus, VersionsDir};
use crate::version::order::Version;

const UNPACK_DIR: &str = "unpacked";

/// Digest a catalog declares for an archive, matched case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChecksumAlgorithm {
    Sha1,
    Sha256,
}

impl ChecksumAlgorithm {
    fn parse(name: &str) -> Result<Self, InstallError> {
        match name.replace('-', "").to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            _ => Err(InstallError::UnsupportedChecksum(name.to_string())),
        }
    }

    fn hasher(self) -> Hasher {
        match self {
            Self::Sha1 => Hasher::Sha1(sha1::Sha1::new()),
            Self::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }
}

enum Hasher {
    Sha1(sha1::Sha1),
    Sha256(Sha256),
}

impl Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(hasher) => hasher.update(data),
            Self::Sha256(hasher) => hasher.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha1(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha256(hasher) => format!("{:x}", hasher.finalize()),
        }
    }
}

/// Archive layout, told apart by the download URL's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    fn from_url(url: &str) -> Result<Self, InstallError> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if path.ends_with(".zip") {
            Ok(Self::Zip)
        } else {
            Err(InstallError::UnsupportedArchive(url.to_string()))
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            Self::TarGz => "archive.tar.gz",
            Self::Zip => "archive.zip",
        }
    }

    fn unpack(self, archive_path: &Path, dest: &Path) -> Result<(), InstallError> {
        match self {
            Self::TarGz => unpack_tar_gz(archive_path, dest),
            Self::Zip => unpack_zip(archive_path, dest),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Installer: Send + Sync {
    /// Installs `version` unless it is already installed.
    ///
    /// Returns true when a new install happened.
    async fn ensure_installed(&self, version: &Version) -> Result<bool, InstallError>;
}

/// Installs versions from the archives listed in a catalog
pub struct ArchiveInstaller {
    client: reqwest::Client,
    versions_dir: VersionsDir,
    catalog: Arc<dyn CatalogProvider>,
}

impl ArchiveInstaller {
    pub fn new(versions_dir: VersionsDir, catalog: Arc<dyn CatalogProvider>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(APP_NAME)
                .build()
                .expect("Failed to create HTTP client"),
            versions_dir,
            catalog,
        }
    }

    async fn install(
        &self,
        version: &Version,
        archive: &ArchiveDescriptor,
    ) -> Result<(), InstallError> {
        let algorithm = ChecksumAlgorithm::parse(&archive.checksum_algorithm)?;
        let format = ArchiveFormat::from_url(&archive.url)?;

        let root = self.versions_dir.root();
        std::fs::create_dir_all(root)
            .map_err(|e| InstallError::io(format!("failed to create {}", root.display()), e))?;

        // Staged next to the final location so the last step is a plain rename
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(root)
            .map_err(|e| InstallError::io("failed to create staging directory", e))?;

        let archive_path = staging.path().join(format.file_name());
        info!("Downloading go {} from {}", version, archive.url);
        let checksum = self
            .download(&archive.url, &archive_path, algorithm)
            .await?;
        if !checksum.eq_ignore_ascii_case(archive.checksum.trim()) {
            return Err(InstallError::ChecksumMismatch {
                version: version.to_string(),
            });
        }

        let unpack_dir = staging.path().join(UNPACK_DIR);
        format.unpack(&archive_path, &unpack_dir)?;

        let distribution = single_top_level_dir(&unpack_dir)?;
        let go_binary = distribution
            .join("bin")
            .join(format!("{}{}", TOOL_NAME, std::env::consts::EXE_SUFFIX));
        if !go_binary.is_file() {
            return Err(InstallError::InvalidArchive {
                version: version.to_string(),
                tool: TOOL_NAME.to_string(),
            });
        }

        let destination = self.versions_dir.version_dir(version);
        std::fs::rename(&distribution, &destination).map_err(|e| {
            InstallError::io(format!("failed to move go {} into place", version), e)
        })?;

        info!("Installed go {} into {:?}", version, destination);
        Ok(())
    }

    /// Streams `url` into `dest`, returning the hex digest of the content
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        algorithm: ChecksumAlgorithm,
    ) -> Result<String, InstallError> {
        let download_err = |source| InstallError::Download {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(download_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| InstallError::io(format!("failed to create {}", dest.display()), e))?;
        let mut hasher = algorithm.hasher();
        let mut downloaded: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(download_err)?;
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|e| InstallError::io(format!("failed to write {}", dest.display()), e))?;
            downloaded += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| InstallError::io(format!("failed to write {}", dest.display()), e))?;

        debug!("Downloaded {} bytes from {}", downloaded, url);
        Ok(hasher.finalize_hex())
    }
}

#[async_trait::async_trait]
impl Installer for ArchiveInstaller {
    async fn ensure_installed(&self, version: &Version) -> Result<bool, InstallError> {
        match self.versions_dir.status(version) {
            InstallStatus::Installed => {
                debug!("go {} already installed", version);
                return Ok(false);
            }
            InstallStatus::Foreign => {
                return Err(InstallError::Integrity {
                    path: self.versions_dir.version_dir(version),
                });
            }
            InstallStatus::Missing => {}
        }

        let catalog = self.catalog.load_catalog().await?;
        let archive = catalog
            .get(version)
            .ok_or_else(|| InstallError::NotAvailable(version.to_string()))?;

        self.install(version, archive).await?;
        Ok(true)
    }
}

fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> Result<(), InstallError> {
    let file = std::fs::File::open(archive_path).map_err(|e| {
        InstallError::io(format!("failed to open {}", archive_path.display()), e)
    })?;

    tar::Archive::new(GzDecoder::new(file))
        .unpack(dest)
        .map_err(|e| InstallError::io("failed to unpack archive", e))
}

fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<(), InstallError> {
    let file = std::fs::File::open(archive_path).map_err(|e| {
        InstallError::io(format!("failed to open {}", archive_path.display()), e)
    })?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| InstallError::zip("failed to read zip archive", e))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| InstallError::zip("failed to read zip entry", e))?;
        let Some(name) = entry.enclosed_name() else {
            warn!("Skipping zip entry with unsafe path {:?}", entry.name());
            continue;
        };
        let out_path = dest.join(name);
        let create_err =
            |e| InstallError::io(format!("failed to create {}", out_path.display()), e);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(create_err)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(create_err)?;
        }
        let mut out_file = std::fs::File::create(&out_path).map_err(create_err)?;
        std::io::copy(&mut entry, &mut out_file).map_err(|e| {
            InstallError::io(format!("failed to extract {}", out_path.display()), e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                    .map_err(|e| {
                        InstallError::io(format!("failed to set mode of {}", out_path.display()), e)
                    })?;
            }
        }
    }
    Ok(())
}

/// Go archives wrap the distribution in a single `go/` directory
fn single_top_level_dir(dir: &Path) -> Result<std::path::PathBuf, InstallError> {
    let read_err = |e| InstallError::io(format!("failed to read {}", dir.display()), e);

    let mut entries = std::fs::read_dir(dir)
        .map_err(read_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;

    if entries.len() == 1 && entries[0].path().is_dir() {
        return Ok(entries.remove(0).path());
    }
    Ok(dir.to_path_buf())
}
