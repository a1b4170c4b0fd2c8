//! Picks the go version to run for a directory
//!
//! The constraint comes from the nearest project (pin file, then go.mod) or,
//! outside any project, from the configured default. A full constraint is an
//! exact pin and never upgraded. A partial one is matched by prefix and may be
//! upgraded according to the upgrade policy. When nothing installed satisfies
//! the constraint, the auto-install policy decides.
//!
//! # Modules
//!
//! - [`prompt`]: Yes/no questions for the `ask` upgrade policy
//! - [`error`]: Error type for resolution

pub mod error;
pub mod prompt;

use std::path::Path;

use tracing::{debug, info};

use crate::config::{AutoInstallPolicy, Configuration, UpgradePolicy};
use crate::project::{DeclarationSource, find_declared_version, find_project_root_within};
use crate::version::catalog::CatalogProvider;
use crate::version::installer::Installer;
use crate::version::order::{self, Version};

pub use error::ResolveError;
pub use prompt::{Prompt, StdinPrompt};

/// Where the constraint of a resolution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSource {
    PinFile,
    Manifest,
    DefaultVersion,
    /// Outside any project with no default configured
    None,
}

/// The version a directory asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub version: Option<Version>,
    pub source: ConstraintSource,
}

/// Outcome of a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Version to run
    pub version: Version,
    /// Whether `version` has to be installed before running it
    pub must_install_first: bool,
    /// The version to install, set whenever `must_install_first` is
    pub install_candidate: Option<Version>,
    pub constraint: Constraint,
}

impl Resolution {
    fn installed(version: &Version, constraint: Constraint) -> Self {
        Self {
            version: version.clone(),
            must_install_first: false,
            install_candidate: None,
            constraint,
        }
    }

    fn install(version: &Version, constraint: Constraint) -> Self {
        Self {
            version: version.clone(),
            must_install_first: true,
            install_candidate: Some(version.clone()),
            constraint,
        }
    }
}

/// Finds the constraint for `working_dir` without looking at any inventory.
/// The project lookup stops at `ceiling`.
///
/// An invalid pin, manifest or default version is an error.
pub fn find_constraint(
    working_dir: &Path,
    ceiling: Option<&Path>,
    config: &Configuration,
) -> Result<Constraint, ResolveError> {
    let declaration = match find_project_root_within(working_dir, ceiling)? {
        Some(root) => find_declared_version(&root)?,
        None => None,
    };

    let (raw, source) = match &declaration {
        Some(declaration) => (
            declaration.version.as_str(),
            match declaration.source {
                DeclarationSource::PinFile => ConstraintSource::PinFile,
                DeclarationSource::Manifest => ConstraintSource::Manifest,
            },
        ),
        None if !config.default_version.is_empty() => (
            config.default_version.as_str(),
            ConstraintSource::DefaultVersion,
        ),
        None => {
            return Ok(Constraint {
                version: None,
                source: ConstraintSource::None,
            });
        }
    };

    Ok(Constraint {
        version: Some(raw.parse()?),
        source,
    })
}

/// Combines the constraint of a directory with the installed versions, the
/// catalog and the configured policies.
pub struct Resolver<'a> {
    config: &'a Configuration,
    installed: &'a [Version],
    catalog: &'a dyn CatalogProvider,
    prompt: &'a dyn Prompt,
    ceiling: Option<&'a Path>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        config: &'a Configuration,
        installed: &'a [Version],
        catalog: &'a dyn CatalogProvider,
        prompt: &'a dyn Prompt,
    ) -> Self {
        Self {
            config,
            installed,
            catalog,
            prompt,
            ceiling: None,
        }
    }

    /// Stops the project lookup at `ceiling`
    pub fn with_ceiling(mut self, ceiling: Option<&'a Path>) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub async fn resolve(&self, working_dir: &Path) -> Result<Resolution, ResolveError> {
        let constraint = find_constraint(working_dir, self.ceiling, self.config)?;
        debug!("Resolving {:?} for {:?}", constraint, working_dir);

        let Some(required) = constraint.version.clone() else {
            let latest = order::latest(self.installed)
                .map_err(|_| ResolveError::NoVersionsInstalled)?;
            return Ok(Resolution::installed(latest, constraint));
        };

        if required.is_full() {
            if self.installed.contains(&required) {
                return Ok(Resolution::installed(&required, constraint));
            }
            return self.auto_install(&required, constraint).await;
        }

        match order::latest_with_prefix(self.installed, Some(&required)) {
            Some(installed_match) => self.upgrade(&required, installed_match, constraint).await,
            None => self.auto_install(&required, constraint).await,
        }
    }

    async fn auto_install(
        &self,
        required: &Version,
        constraint: Constraint,
    ) -> Result<Resolution, ResolveError> {
        if self.config.auto_install == AutoInstallPolicy::Disabled {
            return Err(ResolveError::NoSuitableVersion(required.to_string()));
        }

        let catalog = self.catalog.load_catalog().await?;
        let candidate = catalog
            .latest_for_prefix(Some(required))
            .ok_or_else(|| ResolveError::NoVersionsAvailable(required.to_string()))?;

        info!("No installed version satisfies go {}, installing {}", required, candidate);
        Ok(Resolution::install(candidate, constraint))
    }

    async fn upgrade(
        &self,
        required: &Version,
        installed_match: &Version,
        constraint: Constraint,
    ) -> Result<Resolution, ResolveError> {
        let policy = self.config.effective_upgrade_policy();
        if policy == UpgradePolicy::Disabled {
            return Ok(Resolution::installed(installed_match, constraint));
        }

        let catalog = self.catalog.load_catalog().await?;
        let Some(candidate) = catalog
            .latest_for_prefix(Some(required))
            .filter(|candidate| *candidate > installed_match)
        else {
            return Ok(Resolution::installed(installed_match, constraint));
        };

        let accepted = match policy {
            UpgradePolicy::Ask => self
                .prompt
                .confirm(&format!(
                    "Upgrade found for version {}, would you like to install {}?",
                    required, candidate
                ))
                .map_err(ResolveError::Prompt)?,
            _ => true,
        };

        if accepted {
            info!("Upgrading go {} from {} to {}", required, installed_match, candidate);
            Ok(Resolution::install(candidate, constraint))
        } else {
            Ok(Resolution::installed(installed_match, constraint))
        }
    }
}

/// Resolves, then installs the chosen version when the resolution asks for it
pub async fn resolve_and_install(
    resolver: &Resolver<'_>,
    installer: &dyn Installer,
    working_dir: &Path,
) -> Result<Resolution, ResolveError> {
    let resolution = resolver.resolve(working_dir).await?;
    if let Some(candidate) = &resolution.install_candidate {
        installer.ensure_installed(candidate).await?;
    }
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::prompt::MockPrompt;
    use super::*;
    use crate::config::{MANIFEST_FILE, PIN_FILE};
    use crate::version::catalog::{ArchiveDescriptor, Catalog, MockCatalogProvider};
    use crate::version::installer::MockInstaller;
    use mockall::predicate::eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn versions(list: &[&str]) -> Vec<Version> {
        list.iter().map(|s| v(s)).collect()
    }

    fn catalog_of(list: &[&str]) -> Catalog {
        Catalog::new(
            list.iter()
                .map(|s| {
                    (
                        v(s),
                        ArchiveDescriptor {
                            url: format!("https://dl/go{}.tar.gz", s),
                            checksum: String::new(),
                            checksum_algorithm: "SHA256".to_string(),
                        },
                    )
                })
                .collect(),
        )
    }

    fn catalog_provider(list: &[&str], times: usize) -> MockCatalogProvider {
        let catalog = catalog_of(list);
        let mut provider = MockCatalogProvider::new();
        provider
            .expect_load_catalog()
            .times(times)
            .returning(move || Ok(catalog.clone()));
        provider
    }

    fn silent_prompt() -> MockPrompt {
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().never();
        prompt
    }

    fn project(go_mod: Option<&str>, pin: Option<&str>) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        if let Some(go_version) = go_mod {
            std::fs::write(
                temp_dir.path().join(MANIFEST_FILE),
                format!("module example\n\ngo {}\n", go_version),
            )
            .unwrap();
        }
        if let Some(pin) = pin {
            std::fs::write(temp_dir.path().join(PIN_FILE), pin).unwrap();
        }
        temp_dir
    }

    fn config(auto_install: AutoInstallPolicy, upgrades: Option<UpgradePolicy>) -> Configuration {
        Configuration {
            auto_install,
            upgrades,
            ..Configuration::default()
        }
    }

    #[tokio::test]
    async fn manifest_uses_latest_installed_match_when_upgrades_disabled() {
        let project = project(Some("1.14"), None);
        let config = config(AutoInstallPolicy::Missing, Some(UpgradePolicy::Disabled));
        let installed = versions(&["1.14.1", "1.14.2", "1.15.0"]);
        let catalog = catalog_provider(&[], 0);
        let prompt = silent_prompt();

        let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v("1.14.2"));
        assert!(!resolution.must_install_first);
        assert_eq!(resolution.install_candidate, None);
        assert_eq!(resolution.constraint.source, ConstraintSource::Manifest);
    }

    #[tokio::test]
    async fn pin_wins_over_manifest_and_skips_upgrades() {
        let project = project(Some("1.14"), Some("1.14.1\n"));
        let config = config(AutoInstallPolicy::Enabled, Some(UpgradePolicy::Auto));
        let installed = versions(&["1.14.1", "1.14.2"]);
        let catalog = catalog_provider(&[], 0);
        let prompt = silent_prompt();

        let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v("1.14.1"));
        assert!(!resolution.must_install_first);
        assert_eq!(resolution.constraint.source, ConstraintSource::PinFile);
    }

    #[tokio::test]
    async fn auto_upgrade_installs_newer_catalog_version() {
        let project = project(Some("1.14"), None);
        let config = config(AutoInstallPolicy::Missing, Some(UpgradePolicy::Auto));
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&["1.14.2", "1.14.5", "1.15.0"], 1);
        let prompt = silent_prompt();
        let mut installer = MockInstaller::new();
        installer
            .expect_ensure_installed()
            .with(eq(v("1.14.5")))
            .times(1)
            .returning(|_| Ok(true));

        let resolver = Resolver::new(&config, &installed, &catalog, &prompt);
        let resolution = resolve_and_install(&resolver, &installer, project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v("1.14.5"));
        assert!(resolution.must_install_first);
        assert_eq!(resolution.install_candidate, Some(v("1.14.5")));
    }

    #[tokio::test]
    async fn unset_upgrades_follow_auto_install_enabled() {
        let project = project(Some("1.14"), None);
        let config = config(AutoInstallPolicy::Enabled, None);
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&["1.14.5"], 1);
        let prompt = silent_prompt();

        let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v("1.14.5"));
        assert!(resolution.must_install_first);
    }

    #[tokio::test]
    async fn auto_upgrade_keeps_installed_when_nothing_newer() {
        let project = project(Some("1.14"), None);
        let config = config(AutoInstallPolicy::Missing, Some(UpgradePolicy::Auto));
        let installed = versions(&["1.14.5"]);
        let catalog = catalog_provider(&["1.14.2", "1.14.5"], 1);
        let prompt = silent_prompt();

        let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v("1.14.5"));
        assert!(!resolution.must_install_first);
    }

    #[rstest]
    #[case(true, "1.14.5", true)]
    #[case(false, "1.14.2", false)]
    #[tokio::test]
    async fn ask_upgrade_follows_answer(
        #[case] answer: bool,
        #[case] expected: &str,
        #[case] must_install_first: bool,
    ) {
        let project = project(Some("1.14"), None);
        let config = config(AutoInstallPolicy::Missing, Some(UpgradePolicy::Ask));
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&["1.14.5"], 1);
        let mut prompt = MockPrompt::new();
        prompt
            .expect_confirm()
            .withf(|question| question.contains("install 1.14.5"))
            .times(1)
            .returning(move |_| Ok(answer));

        let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v(expected));
        assert_eq!(resolution.must_install_first, must_install_first);
    }

    #[tokio::test]
    async fn ask_upgrade_propagates_prompt_failure() {
        let project = project(Some("1.14"), None);
        let config = config(AutoInstallPolicy::Missing, Some(UpgradePolicy::Ask));
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&["1.14.5"], 1);
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().returning(|_| {
            Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "no answer provided",
            ))
        });

        let result = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await;

        assert!(matches!(result, Err(ResolveError::Prompt(_))));
    }

    #[tokio::test]
    async fn missing_version_installs_latest_catalog_match() {
        let project = project(Some("1.15"), None);
        let config = config(AutoInstallPolicy::Missing, None);
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&["1.15.0", "1.15.10", "1.15.9", "1.16.0"], 1);
        let prompt = silent_prompt();

        let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v("1.15.10"));
        assert_eq!(resolution.install_candidate, Some(v("1.15.10")));
    }

    #[tokio::test]
    async fn missing_pin_installs_exact_version() {
        let project = project(None, Some("1.14.1"));
        let config = config(AutoInstallPolicy::Missing, None);
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&["1.14.1", "1.14.2"], 1);
        let prompt = silent_prompt();

        let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v("1.14.1"));
        assert!(resolution.must_install_first);
    }

    #[tokio::test]
    async fn auto_install_disabled_fails_without_catalog_lookup() {
        let project = project(Some("1.15"), None);
        let config = config(AutoInstallPolicy::Disabled, None);
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&[], 0);
        let prompt = silent_prompt();

        let err = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::NoSuitableVersion(_)));
        assert_eq!(err.to_string(), "no suitable version installed for go 1.15");
    }

    #[tokio::test]
    async fn missing_version_fails_when_catalog_has_no_match() {
        let project = project(Some("1.99"), None);
        let config = config(AutoInstallPolicy::Enabled, None);
        let installed = versions(&[]);
        let catalog = catalog_provider(&["1.14.2"], 1);
        let prompt = silent_prompt();

        let err = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "no versions available for go 1.99");
    }

    #[tokio::test]
    async fn invalid_pin_is_a_validation_error() {
        let project = project(None, Some("latest"));
        let config = Configuration::default();
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&[], 0);
        let prompt = silent_prompt();

        let result = Resolver::new(&config, &installed, &catalog, &prompt)
            .resolve(project.path())
            .await;

        assert!(matches!(result, Err(ResolveError::Version(_))));
    }

    #[tokio::test]
    async fn installer_errors_propagate_unchanged() {
        let project = project(Some("1.15"), None);
        let config = config(AutoInstallPolicy::Missing, None);
        let installed = versions(&[]);
        let catalog = catalog_provider(&["1.15.2"], 1);
        let prompt = silent_prompt();
        let mut installer = MockInstaller::new();
        installer.expect_ensure_installed().returning(|v| {
            Err(crate::version::error::InstallError::ChecksumMismatch {
                version: v.to_string(),
            })
        });

        let resolver = Resolver::new(&config, &installed, &catalog, &prompt);
        let result = resolve_and_install(&resolver, &installer, project.path()).await;

        assert!(matches!(
            result,
            Err(ResolveError::Install(
                crate::version::error::InstallError::ChecksumMismatch { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn resolve_and_install_skips_installer_when_installed() {
        let project = project(Some("1.14"), None);
        let config = config(AutoInstallPolicy::Missing, Some(UpgradePolicy::Disabled));
        let installed = versions(&["1.14.2"]);
        let catalog = catalog_provider(&[], 0);
        let prompt = silent_prompt();
        let mut installer = MockInstaller::new();
        installer.expect_ensure_installed().never();

        let resolver = Resolver::new(&config, &installed, &catalog, &prompt);
        let resolution = resolve_and_install(&resolver, &installer, project.path())
            .await
            .unwrap();

        assert_eq!(resolution.version, v("1.14.2"));
    }

    mod outside_project {
        use super::*;

        /// A directory with no project markers, used as its own search ceiling
        fn outside_dir() -> TempDir {
            TempDir::new().unwrap()
        }

        #[tokio::test]
        async fn fails_when_nothing_installed_and_no_default() {
            let dir = outside_dir();
            let config = Configuration::default();
            let installed = versions(&[]);
            let catalog = catalog_provider(&[], 0);
            let prompt = silent_prompt();

            let err = Resolver::new(&config, &installed, &catalog, &prompt)
                .with_ceiling(Some(dir.path()))
                .resolve(dir.path())
                .await
                .unwrap_err();

            assert!(matches!(err, ResolveError::NoVersionsInstalled));
            assert_eq!(err.to_string(), "no go versions installed");
        }

        #[tokio::test]
        async fn uses_latest_installed_without_default() {
            let dir = outside_dir();
            let config = config(AutoInstallPolicy::Enabled, Some(UpgradePolicy::Auto));
            let installed = versions(&["1.9.7", "1.14.2", "1.10.1"]);
            let catalog = catalog_provider(&[], 0);
            let prompt = silent_prompt();

            let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
                .with_ceiling(Some(dir.path()))
                .resolve(dir.path())
                .await
                .unwrap();

            assert_eq!(resolution.version, v("1.14.2"));
            assert_eq!(resolution.constraint.source, ConstraintSource::None);
        }

        #[tokio::test]
        async fn partial_default_behaves_like_manifest() {
            let dir = outside_dir();
            let config = Configuration {
                default_version: "1.14".to_string(),
                upgrades: Some(UpgradePolicy::Disabled),
                ..Configuration::default()
            };
            let installed = versions(&["1.14.1", "1.14.2", "1.15.0"]);
            let catalog = catalog_provider(&[], 0);
            let prompt = silent_prompt();

            let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
                .with_ceiling(Some(dir.path()))
                .resolve(dir.path())
                .await
                .unwrap();

            assert_eq!(resolution.version, v("1.14.2"));
            assert_eq!(
                resolution.constraint,
                Constraint {
                    version: Some(v("1.14")),
                    source: ConstraintSource::DefaultVersion,
                }
            );
        }

        #[tokio::test]
        async fn full_default_behaves_like_pin() {
            let dir = outside_dir();
            let config = Configuration {
                default_version: "1.14.1".to_string(),
                upgrades: Some(UpgradePolicy::Auto),
                ..Configuration::default()
            };
            let installed = versions(&["1.14.1", "1.14.2"]);
            let catalog = catalog_provider(&[], 0);
            let prompt = silent_prompt();

            let resolution = Resolver::new(&config, &installed, &catalog, &prompt)
                .with_ceiling(Some(dir.path()))
                .resolve(dir.path())
                .await
                .unwrap();

            assert_eq!(resolution.version, v("1.14.1"));
        }

        #[test]
        fn invalid_default_is_a_validation_error() {
            let dir = outside_dir();
            let config = Configuration {
                default_version: "1.x".to_string(),
                ..Configuration::default()
            };

            let result = find_constraint(dir.path(), Some(dir.path()), &config);

            assert!(matches!(result, Err(ResolveError::Version(_))));
        }
    }
}
