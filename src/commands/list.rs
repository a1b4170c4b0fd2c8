use std::io::Write;

use anyhow::Context as _;

use crate::commands::Context;
use crate::version::order::{self, Version};

pub async fn available(ctx: &Context, out: &mut impl Write) -> anyhow::Result<()> {
    let catalog = ctx
        .catalog
        .load_catalog()
        .await
        .context("failed to load available versions")?;
    print_sorted(catalog.versions().cloned().collect(), out)
}

pub fn installed(ctx: &Context, out: &mut impl Write) -> anyhow::Result<()> {
    print_sorted(ctx.installed_versions()?, out)
}

fn print_sorted(versions: Vec<Version>, out: &mut impl Write) -> anyhow::Result<()> {
    let versions = order::sort_versions(versions.iter().map(Version::to_string).collect())?;
    for version in versions {
        writeln!(out, "{}", version)?;
    }
    Ok(())
}
