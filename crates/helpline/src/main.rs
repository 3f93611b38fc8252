// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpline - a support-inbox relay bot.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use helpline_config::HelplineConfig;

/// Helpline - one public bot identity in front of a team of administrators.
#[derive(Parser, Debug)]
#[command(name = "helpline", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the relay (default).
    Serve,
    /// Print contact, pending and roster counts from the database.
    Stat,
    /// Validate the configuration and print the effective values as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => helpline_config::load_and_validate_path(path),
        None => helpline_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            helpline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Stat => match status::StatusReport::collect(&config).await {
            Ok(report) => println!("{}", report.render()),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Commands::Config => print_config(&config),
    }
}

fn print_config(config: &HelplineConfig) {
    let mut shown = config.clone();
    if shown.telegram.bot_token.is_some() {
        shown.telegram.bot_token = Some("<redacted>".to_string());
    }
    match toml::to_string_pretty(&shown) {
        Ok(text) => print!("{text}"),
        Err(e) => {
            eprintln!("error: cannot render configuration: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["helpline"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["helpline", "stat", "--config", "/tmp/h.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Stat)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/h.toml")));
    }
}
