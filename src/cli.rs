//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// fixdoc - Turn documentation change requests into scoped edits and pull requests
#[derive(Parser, Debug)]
#[command(name = "fixdoc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the fixdoc.yaml configuration file
    ///
    /// Defaults to ./fixdoc.yaml, then the platform config directory
    /// (e.g. ~/.config/fixdoc/config.yaml on Linux).
    #[arg(short, long, global = true, value_name = "FILE", env = "FIXDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the slash-command server
    Serve(commands::serve::ServeArgs),

    /// Run one change request in the foreground
    Fix(commands::fix::FixArgs),

    /// Show which document and section a request would edit
    Locate(commands::locate::LocateArgs),

    /// Validate the configuration file
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Initialize `env_logger`; `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when run from tests
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .try_init();
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let context = commands::Context {
            config: self.config,
            color: self.color,
        };

        match self.command {
            Commands::Serve(args) => commands::serve::execute(args, &context),
            Commands::Fix(args) => commands::fix::execute(args, &context),
            Commands::Locate(args) => commands::locate::execute(args, &context),
            Commands::Validate(args) => commands::validate::execute(args, &context),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
