//! CLI for lazykit.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use lazykit_core::config;

use commands::{run_completions, run_defaults, run_man, run_retry, run_schedule, RunArgs};

/// Top-level CLI for lazykit.
#[derive(Debug, Parser)]
#[command(name = "lazykit")]
#[command(about = "lazykit: run commands with bounded retries and exponential backoff", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a program, retrying it when it fails.
    Run(RunArgs),

    /// Show the default retry policy from the config file.
    Defaults {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the backoff waits the configured policy would use.
    Schedule {
        /// Number of waits to print (default: one less than max retries).
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page.
    Man,
}

impl CliCommand {
    /// Parse arguments and dispatch. Returns the process exit code.
    pub fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run(args) => run_retry(&cfg, args),
            CliCommand::Defaults { json } => run_defaults(&cfg, json).map(|()| 0),
            CliCommand::Schedule { count } => run_schedule(&cfg, count).map(|()| 0),
            CliCommand::Completions { shell } => run_completions(shell).map(|()| 0),
            CliCommand::Man => run_man().map(|()| 0),
        }
    }
}

#[cfg(test)]
mod tests;
