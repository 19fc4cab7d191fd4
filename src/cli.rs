//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// assetpipe asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: assetpipe.toml)
    #[arg(short = 'C', long, default_value = "assetpipe.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands (default: dev)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build all assets once, then watch and serve with live reload
    #[command(visible_alias = "d")]
    Dev {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable file watching for auto-rebuild
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Build all assets once and exit
    #[command(visible_alias = "b")]
    Build {
        /// Clean output directory completely before building
        #[arg(short, long)]
        clean: bool,
    },
}

impl Cli {
    /// Serve overrides given on the command line, if any.
    pub fn serve_overrides(&self) -> (Option<std::net::IpAddr>, Option<u16>, Option<bool>) {
        match &self.command {
            Some(Commands::Dev {
                interface,
                port,
                watch,
            }) => (*interface, *port, *watch),
            _ => (None, None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_args_defaults_to_dev() {
        let cli = Cli::parse_from(["assetpipe"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("assetpipe.toml"));
    }

    #[test]
    fn test_dev_overrides() {
        let cli = Cli::parse_from(["assetpipe", "dev", "-p", "8080", "--watch", "false"]);
        let (interface, port, watch) = cli.serve_overrides();
        assert!(interface.is_none());
        assert_eq!(port, Some(8080));
        assert_eq!(watch, Some(false));
    }

    #[test]
    fn test_build_clean() {
        let cli = Cli::parse_from(["assetpipe", "build", "--clean"]);
        match cli.command {
            Some(Commands::Build { clean }) => assert!(clean),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
