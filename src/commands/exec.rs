//! Running a wrapped command (`go`, `gofmt`, ...) with the resolved version

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use anyhow::bail;
use tracing::debug;

use crate::commands::Context;
use crate::resolve::{Resolver, resolve_and_install};

/// A command ready to be run from a resolved installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommand {
    pub binary: PathBuf,
    /// Passed as `argv[0]`
    pub command: String,
    pub args: Vec<OsString>,
}

impl SubCommand {
    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(&self.args);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.arg0(&self.command);
        }
        command
    }

    /// Replaces the current process. Only returns on failure.
    #[cfg(unix)]
    pub fn exec(self) -> anyhow::Result<()> {
        use std::os::unix::process::CommandExt;
        let err = self.command().exec();
        Err(anyhow::Error::new(err).context(format!("failed to run {}", self.binary.display())))
    }

    /// Runs the command and exits with its status code
    #[cfg(not(unix))]
    pub fn exec(self) -> anyhow::Result<()> {
        use anyhow::Context as _;
        let status = self
            .command()
            .status()
            .with_context(|| format!("failed to run {}", self.binary.display()))?;
        std::process::exit(status.code().unwrap_or(1));
    }
}

/// Resolves the version for the working directory, installing it when the
/// policies ask for it, and locates `command` in that installation.
pub async fn prepare(
    ctx: &Context,
    command: &str,
    args: Vec<OsString>,
) -> anyhow::Result<SubCommand> {
    let installed = ctx.installed_versions()?;
    let resolver = Resolver::new(
        &ctx.config,
        &installed,
        ctx.catalog.as_ref(),
        ctx.prompt.as_ref(),
    )
    .with_ceiling(ctx.project_ceiling());
    let resolution =
        resolve_and_install(&resolver, ctx.installer.as_ref(), &ctx.working_dir).await?;

    let binary = ctx.versions_dir().binary_path(&resolution.version, command);
    if !binary.is_file() {
        bail!("go {} has no command {}", resolution.version, command);
    }

    debug!("Running {:?} with args {:?}", binary, args);
    Ok(SubCommand {
        binary,
        command: command.to_string(),
        args,
    })
}
