//! Server configuration.
//!
//! The port is the only required input and comes from the command line.
//! Everything else has a default and can be overridden by an optional YAML
//! settings file:
//!
//! ```yaml
//! aliases:
//!   "/": "/index.html"
//!   "/home": "/index.html"
//! read_chunk_size: 4096
//! max_request_line: 8192
//! backlog: 64
//! ```

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

/// Default resource root, relative to the working directory.
pub const DEFAULT_ROOT: &str = "./res";

/// Command line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "httpserv")]
#[command(about = "Minimal static-file HTTP server")]
pub struct Args {
    /// Port to listen on
    pub port: u16,

    /// Directory files are served from
    #[arg(long, default_value = DEFAULT_ROOT, env = "HTTPSERV_ROOT")]
    pub root: PathBuf,

    /// Optional YAML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Tunables read from the settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Exact-match URI substitutions applied before file lookup.
    pub aliases: HashMap<String, String>,
    /// Bytes requested from the socket per read.
    pub read_chunk_size: usize,
    /// Upper bound on the request line, terminator included.
    pub max_request_line: usize,
    /// Listen backlog.
    pub backlog: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let mut aliases = HashMap::new();
        aliases.insert("/".to_string(), "/index.html".to_string());

        Self {
            aliases,
            read_chunk_size: 4096,
            max_request_line: 8192,
            backlog: 64,
        }
    }
}

impl Settings {
    pub fn from_yaml(src: &str) -> anyhow::Result<Self> {
        let settings = serde_yaml::from_str(src).context("invalid settings file")?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read settings file {}", path.display()))?;
        Self::from_yaml(&src)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            read_chunk_size: self.read_chunk_size,
            max_request_line: self.max_request_line,
            backlog: self.backlog,
        }
    }
}

/// Per-connection and listener bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub read_chunk_size: usize,
    pub max_request_line: usize,
    pub backlog: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Settings::default().limits()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub root: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Loads the settings file named by `args`, if any.
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let settings = match &args.config {
            Some(path) => {
                let settings = Settings::from_file(path)?;
                tracing::info!(path = %path.display(), "Loaded settings file");
                settings
            }
            None => Settings::default(),
        };

        Ok(Self {
            port: args.port,
            root: args.root,
            settings,
        })
    }

    /// Startup checks. Any failure here is fatal.
    pub fn validate(&self) -> anyhow::Result<()> {
        let meta = std::fs::metadata(&self.root)
            .with_context(|| format!("cannot open resource dir {}", self.root.display()))?;
        if !meta.is_dir() {
            anyhow::bail!("resource dir {} is not a directory", self.root.display());
        }

        if self.settings.read_chunk_size == 0 {
            anyhow::bail!("read_chunk_size must be greater than zero");
        }
        // Room for at least "\r\n".
        if self.settings.max_request_line < 2 {
            anyhow::bail!("max_request_line must be at least 2");
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn limits(&self) -> Limits {
        self.settings.limits()
    }
}
