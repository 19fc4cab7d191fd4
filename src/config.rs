//! Pipeline configuration.
//!
//! Loaded from `assetpipe.toml` at the project root; a missing file means
//! all defaults. Command-line flags override file values.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! source = "src"              # Source tree root
//! output = "dist"             # Output tree root
//!
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port number
//! watch = true                # Auto-rebuild on file changes
//! ```

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::Cli;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub serve: ServeConfig,
}

/// `[paths]` section: source and output tree roots.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source tree root, relative to the working directory.
    pub source: PathBuf,

    /// Output tree root, relative to the working directory.
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src"),
            output: PathBuf::from("dist"),
        }
    }
}

/// `[serve]` section: development server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Enable file watcher for live reload.
    pub watch: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            watch: true,
        }
    }
}

impl Config {
    /// Load configuration from the file named by the CLI, then apply CLI
    /// overrides. A missing config file is not an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = Self::from_file(&cli.config)?;

        let (interface, port, watch) = cli.serve_overrides();
        if let Some(interface) = interface {
            config.serve.interface = interface;
        }
        if let Some(port) = port {
            config.serve.port = port;
        }
        if let Some(watch) = watch {
            config.serve.watch = watch;
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config: {}", path.display()))
    }

    /// Source tree root.
    pub fn source_dir(&self) -> &Path {
        &self.paths.source
    }

    /// Output tree root.
    pub fn output_dir(&self) -> &Path {
        &self.paths.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Config {
        toml::from_str(raw).expect("config should parse")
    }

    #[test]
    fn test_defaults() {
        let config = parse("");
        assert_eq!(config.paths.source, PathBuf::from("src"));
        assert_eq!(config.paths.output, PathBuf::from("dist"));
        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 3000);
        assert!(config.serve.watch);
    }

    #[test]
    fn test_serve_section() {
        let config = parse("[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nwatch = false");
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_partial_override() {
        let config = parse("[serve]\nport = 5000");
        // port is overridden
        assert_eq!(config.serve.port, 5000);
        // interface and watch use defaults
        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert!(config.serve.watch);
    }

    #[test]
    fn test_paths_section() {
        let config = parse("[paths]\nsource = \"assets\"\noutput = \"public\"");
        assert_eq!(config.paths.source, PathBuf::from("assets"));
        assert_eq!(config.paths.output, PathBuf::from("public"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::from_file(Path::new("/nonexistent/assetpipe.toml")).unwrap();
        assert_eq!(config.serve.port, 3000);
    }
}
