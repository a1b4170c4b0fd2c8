use std::io::Write;

use crate::commands::{Context, parse_version};
use crate::project::ProjectError;
use crate::project::pin::{pin_version, unpin_version};
use crate::resolve::{ResolveError, find_constraint};
use crate::version::order;

pub fn pin(ctx: &Context, version: &str, out: &mut impl Write) -> anyhow::Result<()> {
    if !order::is_full_version(version) {
        return Err(ProjectError::PinRequiresFullVersion(version.to_string()).into());
    }
    let version = parse_version(version)?;
    if let Some(pin_path) = pin_version(&ctx.working_dir, ctx.project_ceiling(), &version)? {
        writeln!(out, "Pinned version {} in {}", version, pin_path.display())?;
    }
    Ok(())
}

pub fn unpin(ctx: &Context, out: &mut impl Write) -> anyhow::Result<()> {
    if unpin_version(&ctx.working_dir, ctx.project_ceiling())? {
        writeln!(out, "Removed pinned version")?;
    }
    Ok(())
}

/// Prints the version the current directory asks for, and which installed
/// version would be used for it. Never installs or prompts.
pub fn version(ctx: &Context, out: &mut impl Write) -> anyhow::Result<()> {
    let constraint = find_constraint(&ctx.working_dir, ctx.project_ceiling(), &ctx.config)?;
    let installed = ctx.installed_versions()?;

    let Some(required) = constraint.version else {
        let latest = order::latest(&installed).map_err(|_| ResolveError::NoVersionsInstalled)?;
        writeln!(out, "{}", latest)?;
        return Ok(());
    };

    match order::latest_with_prefix(&installed, Some(&required)) {
        Some(matching) if *matching == required => writeln!(out, "{}", required)?,
        Some(matching) => writeln!(
            out,
            "{} (specific version to use: {})",
            required, matching
        )?,
        None => writeln!(out, "{} (no compatible installed version found)", required)?,
    }
    Ok(())
}
