// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jiraffe - relays new Jira issues into Telegram campus topics.
//!
//! This is the binary entry point for the relay.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use jiraffe_config::model::JiraffeConfig;

/// Jiraffe - relays new Jira issues into Telegram campus topics.
#[derive(Parser, Debug)]
#[command(name = "jiraffe", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the relay (default).
    Serve,
    /// Check configuration, database and remote connectivity.
    Doctor {
        /// Run additional checks (database integrity, memory).
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Validate configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&Path>) -> JiraffeConfig {
    let loaded = match path {
        Some(path) => jiraffe_config::load_and_validate_path(path),
        None => jiraffe_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            jiraffe_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Doctor { deep, plain } => {
            doctor::run_doctor(&config, cli.config.as_deref(), deep, plain).await;
        }
        Commands::CheckConfig => {
            println!(
                "jiraffe: configuration is valid (agent.name={}, database={})",
                config.agent.name, config.storage.database_path
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0);
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::parse_from(["jiraffe"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["jiraffe", "doctor", "--plain", "--config", "/tmp/j.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/j.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Doctor {
                deep: false,
                plain: true
            })
        ));
    }

    #[test]
    fn check_config_parses() {
        let cli = Cli::parse_from(["jiraffe", "check-config"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }
}
