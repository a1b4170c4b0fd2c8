use std::io::Write;

use crate::commands::{Context, parse_version};

pub fn run(ctx: &Context, version: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let version = parse_version(version)?;
    ctx.versions_dir().uninstall(&version)?;
    writeln!(out, "Successfully uninstalled version {}", version)?;
    Ok(())
}
