//! CLI for eeve: HTTP requests with retry and exponential backoff.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use eeve_core::config::{self, EeveConfig};
use eeve_core::http::Method;
use std::path::{Path, PathBuf};

use commands::{run_completions, run_config, run_fetch, run_man};

/// Top-level CLI for eeve.
#[derive(Debug, Parser)]
#[command(name = "eeve")]
#[command(about = "eeve: HTTP requests that retry with exponential backoff", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/eeve/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send one request, retrying 5xx and transient network errors.
    Fetch(FetchArgs),

    /// Show the config file path and the effective configuration.
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Print the man page to stdout.
    Man,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Absolute HTTP/HTTPS URL.
    pub url: String,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: Method,

    /// Extra request header, e.g. -H "Accept: application/json". Repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Request body.
    #[arg(short = 'd', long)]
    pub data: Option<String>,

    /// Give up after N retries (overrides config).
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Give up once this many seconds have passed; 0 = no time limit (overrides config).
    #[arg(long, value_name = "SECS")]
    pub max_elapsed: Option<u64>,

    /// Also retry on this status code (e.g. 429). Repeatable.
    #[arg(long = "retry-status", value_name = "CODE")]
    pub retry_statuses: Vec<u16>,

    /// Print status line and response headers before the body.
    #[arg(short = 'i', long)]
    pub include: bool,

    /// Print a JSON report (status, attempts, termination, error) instead of the body.
    #[arg(long)]
    pub json: bool,
}

fn load_config(path: Option<&Path>) -> Result<EeveConfig> {
    let cfg = match path {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch(args) => {
                let cfg = load_config(cli.config.as_deref())?;
                run_fetch(&cfg, &args).await?;
            }
            CliCommand::Config => {
                let cfg = load_config(cli.config.as_deref())?;
                run_config(cli.config.as_deref(), &cfg)?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
