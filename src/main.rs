use std::ffi::OsString;
use std::path::Path;

use clap::{Parser, Subcommand};
use gowrap::commands::{self, Context, exec::SubCommand};
use gowrap::config::{APP_NAME, AutoInstallPolicy, Paths, SelfUpgradePolicy, UpgradePolicy};
use gowrap::logging;

#[derive(Debug, Parser)]
#[command(name = "gowrap")]
#[command(version, about = "Go toolchain version manager")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Install the latest go version matching a version or prefix
    Install { version: String },
    /// Remove an installed go version
    Uninstall { version: String },
    /// List go versions
    #[command(subcommand)]
    List(ListCommand),
    /// Change gowrap settings
    #[command(subcommand)]
    Configure(ConfigureCommand),
    /// Manage the go version of the current project
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Run a go command with the version resolved for the current directory
    Exec {
        command: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
}

#[derive(Debug, Subcommand)]
enum ListCommand {
    /// Versions that can be installed on this platform
    Available,
    /// Versions already installed
    Installed,
}

#[derive(Debug, Subcommand)]
enum ConfigureCommand {
    /// Version used outside any project
    Default { version: String },
    /// When missing versions are installed automatically
    Autoinstall {
        #[arg(value_enum)]
        policy: AutoInstallPolicy,
    },
    /// Whether newer patch releases are installed
    Upgrades {
        #[arg(value_enum)]
        policy: UpgradePolicy,
    },
    /// Whether gowrap upgrades itself
    Selfupgrade {
        #[arg(value_enum)]
        policy: SelfUpgradePolicy,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    /// Pin an exact version for the current project
    Pin { version: String },
    /// Remove the pinned version of the current project
    Unpin,
    /// Show the version the current project uses
    Version,
}

/// How the binary was invoked
#[derive(Debug)]
enum Invocation {
    Cli(Cli),
    /// Through a link named after a go command, e.g. `go build`
    Wrapped { command: String, args: Vec<OsString> },
}

fn parse_invocation(mut args: Vec<OsString>) -> Invocation {
    let wrapped = args
        .first()
        .and_then(|argv0| Path::new(argv0).file_stem())
        .and_then(|stem| stem.to_str())
        .filter(|stem| *stem != APP_NAME)
        .map(String::from);

    match wrapped {
        Some(command) => Invocation::Wrapped {
            command,
            args: args.split_off(1),
        },
        None => Invocation::Cli(Cli::parse_from(args)),
    }
}

fn main() {
    let paths = Paths::from_env();
    let guard = logging::init(&paths.log_dir());

    let result = run(paths, parse_invocation(std::env::args_os().collect()));
    // flush the log file before the process is replaced
    drop(guard);

    let result = result.and_then(|sub| match sub {
        Some(sub) => sub.exec(),
        None => Ok(()),
    });
    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run(paths: Paths, invocation: Invocation) -> anyhow::Result<Option<SubCommand>> {
    let ctx = Context::from_paths(paths, std::env::current_dir()?)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(dispatch(&ctx, invocation))
}

async fn dispatch(ctx: &Context, invocation: Invocation) -> anyhow::Result<Option<SubCommand>> {
    let cli = match invocation {
        Invocation::Wrapped { command, args } => {
            return commands::exec::prepare(ctx, &command, args).await.map(Some);
        }
        Invocation::Cli(cli) => cli,
    };

    let out = &mut std::io::stdout().lock();
    match cli.command {
        Command::Install { version } => commands::install::run(ctx, &version, out).await?,
        Command::Uninstall { version } => commands::uninstall::run(ctx, &version, out)?,
        Command::List(ListCommand::Available) => commands::list::available(ctx, out).await?,
        Command::List(ListCommand::Installed) => commands::list::installed(ctx, out)?,
        Command::Configure(setting) => match setting {
            ConfigureCommand::Default { version } => {
                commands::configure::default_version(ctx, &version, out).await?
            }
            ConfigureCommand::Autoinstall { policy } => {
                commands::configure::auto_install(ctx, policy)?
            }
            ConfigureCommand::Upgrades { policy } => commands::configure::upgrades(ctx, policy)?,
            ConfigureCommand::Selfupgrade { policy } => {
                commands::configure::self_upgrade(ctx, policy)?
            }
        },
        Command::Project(action) => match action {
            ProjectCommand::Pin { version } => commands::project::pin(ctx, &version, out)?,
            ProjectCommand::Unpin => commands::project::unpin(ctx, out)?,
            ProjectCommand::Version => commands::project::version(ctx, out)?,
        },
        Command::Exec { command, args } => {
            return commands::exec::prepare(ctx, &command, args).await.map(Some);
        }
    }
    Ok(None)
}
