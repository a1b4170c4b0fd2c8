//! Test utilities shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use gowrap::commands::Context;
use gowrap::config::{Configuration, MANIFEST_FILE, PIN_FILE, Paths, TOOL_NAME};
use gowrap::resolve::Prompt;
use gowrap::version::catalog::{ArchiveDescriptor, Catalog, CatalogProvider};
use gowrap::version::error::{CatalogError, InstallError};
use gowrap::version::installed::VersionsDir;
use gowrap::version::installer::Installer;
use gowrap::version::Version;

pub fn v(s: &str) -> Version {
    s.parse().unwrap()
}

/// Catalog served from memory, counting how often it is loaded
pub struct FakeCatalog {
    catalog: Catalog,
    loads: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(versions: &[&str]) -> Self {
        let archives = versions
            .iter()
            .map(|s| {
                (
                    v(s),
                    ArchiveDescriptor {
                        url: format!("https://dl.example.com/go{}.tar.gz", s),
                        checksum: String::new(),
                        checksum_algorithm: "SHA256".to_string(),
                    },
                )
            })
            .collect::<HashMap<_, _>>();
        Self {
            catalog: Catalog::new(archives),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.catalog.clone())
    }
}

/// Installer that lays out `bin/go` and records what it installed
pub struct RecordingInstaller {
    versions_dir: VersionsDir,
    installed: Mutex<Vec<Version>>,
}

impl RecordingInstaller {
    pub fn new(versions_dir: VersionsDir) -> Self {
        Self {
            versions_dir,
            installed: Mutex::new(Vec::new()),
        }
    }

    pub fn installed(&self) -> Vec<Version> {
        self.installed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Installer for RecordingInstaller {
    async fn ensure_installed(&self, version: &Version) -> Result<bool, InstallError> {
        if self.versions_dir.binary_path(version, TOOL_NAME).is_file() {
            return Ok(false);
        }
        fake_install(&self.versions_dir, version);
        self.installed.lock().unwrap().push(version.clone());
        Ok(true)
    }
}

/// Prompt with a fixed answer, recording the questions asked
pub struct FixedPrompt {
    answer: bool,
    questions: Mutex<Vec<String>>,
}

impl FixedPrompt {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl Prompt for FixedPrompt {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.answer)
    }
}

pub fn fake_install(versions_dir: &VersionsDir, version: &Version) {
    let binary = versions_dir.binary_path(version, TOOL_NAME);
    std::fs::create_dir_all(binary.parent().unwrap()).unwrap();
    std::fs::write(binary, "#!/bin/sh\n").unwrap();
}

/// Isolated gowrap home plus a go project, all inside a temporary directory
pub struct Workspace {
    pub temp_dir: TempDir,
    pub paths: Paths,
    pub catalog: Arc<FakeCatalog>,
    pub installer: Arc<RecordingInstaller>,
    pub prompt: Arc<FixedPrompt>,
}

impl Workspace {
    pub fn new(available: &[&str]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::with_root(temp_dir.path(), "http://localhost/versions.json");
        let installer = RecordingInstaller::new(VersionsDir::new(paths.versions_dir()));
        Self {
            paths,
            catalog: Arc::new(FakeCatalog::new(available)),
            installer: Arc::new(installer),
            prompt: Arc::new(FixedPrompt::new(true)),
            temp_dir,
        }
    }

    pub fn with_prompt_answer(mut self, answer: bool) -> Self {
        self.prompt = Arc::new(FixedPrompt::new(answer));
        self
    }

    pub fn versions_dir(&self) -> VersionsDir {
        VersionsDir::new(self.paths.versions_dir())
    }

    pub fn install(&self, versions: &[&str]) {
        for version in versions {
            fake_install(&self.versions_dir(), &v(version));
        }
    }

    pub fn save_config(&self, config: &Configuration) {
        self.paths.config_store().save(config).unwrap();
    }

    /// Creates a project directory with a go.mod and an optional pin file
    pub fn project(&self, go_directive: &str, pinned: Option<&str>) -> PathBuf {
        let root = self.temp_dir.path().join("project");
        std::fs::create_dir_all(root.join("cmd/app")).unwrap();
        std::fs::write(
            root.join(MANIFEST_FILE),
            format!("module example.com/app\n\ngo {}\n", go_directive),
        )
        .unwrap();
        if let Some(pinned) = pinned {
            std::fs::write(root.join(PIN_FILE), pinned).unwrap();
        }
        root
    }

    /// A directory outside any project. Project lookup stops at the
    /// workspace root, so projects above the temporary directory are ignored.
    pub fn outside_project(&self) -> PathBuf {
        let dir = self.temp_dir.path().join("elsewhere");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Context for `working_dir`, reading the configuration saved so far
    pub fn context(&self, working_dir: &Path) -> Context {
        Context::new(
            self.paths.clone(),
            working_dir.to_path_buf(),
            self.catalog.clone(),
            self.installer.clone(),
            self.prompt.clone(),
        )
        .unwrap()
    }
}

/// Builds a gzipped tarball with the given files
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn sha256_hex(content: &[u8]) -> String {
    Sha256::digest(content)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
