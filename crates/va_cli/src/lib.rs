mod cmd;
pub mod error;
mod parser;
mod term;

use std::{
    fmt,
    io::{self, Write as _},
    path::PathBuf,
    process::ExitCode,
};

use clap::{ArgAction, Parser};
use cmd::Commands;
use error::{Error, Result};
use tracing::{error, trace};
use va_config::AppConfig;

/// A streaming chat client for Workers AI models.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten, next_help_heading = "Global Options")]
    globals: Globals,

    #[command(subcommand, next_help_heading = "Options")]
    command: Option<Commands>,
}

#[derive(Debug, clap::Args)]
pub struct Globals {
    /// Override a configuration value for the duration of the command.
    #[arg(short, long = "cfg", value_name = "KEY=VALUE", global = true, action = ArgAction::Append)]
    config: Vec<String>,

    /// Load configuration from this file, in addition to the default
    /// locations.
    #[arg(long, value_name = "PATH", global = true)]
    config_file: Option<PathBuf>,

    /// Increase verbosity of logging.
    ///
    /// Can be specified multiple times to increase verbosity.
    ///
    /// Defaults to printing "error" messages. For each increase in verbosity,
    /// the log level is set to "warn", "info", "debug", and "trace"
    /// respectively.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output.
    #[arg(short, long, global = true)]
    quiet: bool,
}

impl fmt::Display for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entry(&"config", &self.globals.config)
            .entry(&"config_file", &self.globals.config_file)
            .entry(&"verbose", &self.globals.verbose)
            .entry(&"quiet", &self.globals.quiet)
            .finish()
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    configure_logging(cli.globals.verbose, cli.globals.quiet);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => return report(&Error::Io(error)),
    };

    match runtime.block_on(run_inner(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report(&error),
    }
}

async fn run_inner(cli: Cli) -> Result<()> {
    trace!(arguments = %cli, "Starting CLI run.");

    let Cli { globals, command } = cli;
    let command = command.unwrap_or_default();

    let mut config = va_config::load(globals.config_file.as_deref())?;
    apply_cli_configs(&globals.config, &mut config)?;

    trace!(command = command.name(), "Running command.");
    command.run(config).await
}

/// Apply CLI config overrides to the [`AppConfig`].
fn apply_cli_configs(overrides: &[String], config: &mut AppConfig) -> Result<()> {
    trace!(overrides = ?overrides, "Applying CLI config overrides.");
    config.apply_overrides(overrides).map_err(Into::into)
}

fn report(error: &Error) -> ExitCode {
    error!(%error, "Command failed.");
    _ = writeln!(io::stderr(), "{error}");

    ExitCode::FAILURE
}

fn configure_logging(verbose: u8, quiet: bool) {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::fmt;

    let mut level = match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    if quiet {
        level = LevelFilter::OFF;
    }

    let mut filter = vec!["off".to_owned()];
    for krate in [
        "chat",
        "cli",
        "client",
        "config",
        "conversation",
        "proxy",
        "stream",
    ] {
        filter.push(format!("va_{krate}={level}"));
    }

    let format = fmt::format().with_target(false).compact();

    if level < LevelFilter::DEBUG {
        tracing_subscriber::fmt()
            .event_format(format)
            .without_time()
            .with_ansi(true)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    } else {
        tracing_subscriber::fmt()
            .event_format(format)
            .with_ansi(true)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    }
}
