use std::io::Write;

use anyhow::{Context as _, bail};

use crate::commands::{Context, parse_version};
use crate::config::{AutoInstallPolicy, Configuration, SelfUpgradePolicy, UpgradePolicy};
use crate::version::order;

/// Sets the version used outside any project, installing it first when no
/// installed version matches.
pub async fn default_version(
    ctx: &Context,
    version: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let required = parse_version(version)?;

    let installed = ctx.installed_versions()?;
    if order::latest_with_prefix(&installed, Some(&required)).is_none() {
        let catalog = ctx
            .catalog
            .load_catalog()
            .await
            .context("failed to load available versions")?;
        let Some(candidate) = catalog.latest_for_prefix(Some(&required)) else {
            bail!("{} is not a valid go version", required);
        };
        if ctx.installer.ensure_installed(candidate).await? {
            writeln!(out, "Successfully installed version {}", candidate)?;
        }
    }

    save(ctx, |config| config.default_version = required.to_string())?;
    writeln!(out, "Default version set to {}", required)?;
    Ok(())
}

pub fn auto_install(ctx: &Context, policy: AutoInstallPolicy) -> anyhow::Result<()> {
    save(ctx, |config| config.auto_install = policy)
}

pub fn upgrades(ctx: &Context, policy: UpgradePolicy) -> anyhow::Result<()> {
    save(ctx, |config| config.upgrades = Some(policy))
}

pub fn self_upgrade(ctx: &Context, policy: SelfUpgradePolicy) -> anyhow::Result<()> {
    save(ctx, |config| config.self_upgrade = policy)
}

fn save(ctx: &Context, update: impl FnOnce(&mut Configuration)) -> anyhow::Result<()> {
    let mut config = ctx.config.clone();
    update(&mut config);
    ctx.paths
        .config_store()
        .save(&config)
        .context("failed to save configuration")
}
