use std::io::Write;

use anyhow::Context as _;

use crate::commands::{Context, parse_version};
use crate::resolve::ResolveError;

/// Installs the latest catalog version matching `prefix`
pub async fn run(ctx: &Context, prefix: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let prefix = parse_version(prefix)?;

    let catalog = ctx
        .catalog
        .load_catalog()
        .await
        .context("failed to load available versions")?;
    let candidate = catalog
        .latest_for_prefix(Some(&prefix))
        .ok_or_else(|| ResolveError::NoVersionsAvailable(prefix.to_string()))?;

    if ctx.installer.ensure_installed(candidate).await? {
        writeln!(out, "Successfully installed version {}", candidate)?;
    } else {
        writeln!(out, "version '{}' was already installed", prefix)?;
    }
    Ok(())
}
