//! Command-line interface for the template-variable engine.
//!
//! # Available Commands
//!
//! - `render` - Substitute template values into a query
//! - `hydrate` - Refresh templates against their data sources
//! - `graph` - Show how templates depend on each other
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - Log level (`RUST_LOG` wins when set)
//! - `--config <PATH>` - Configuration file (default `~/.tempvar/config.toml`)
//! - `--endpoint <URL>` - Default query endpoint, overriding the configuration
//!
//! # Examples
//!
//! ```bash
//! tempvar graph --templates dashboard.json
//! tempvar --endpoint http://localhost:8086/query hydrate -t dashboard.json -f json -o hydrated.json
//! tempvar render -t hydrated.json -Q 'SELECT * FROM cpu WHERE host = :host:'
//! ```

mod common;
mod graph;
mod hydrate;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;

pub use common::load_templates;

/// Settings derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can run commands with an explicit
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
    /// Endpoint overriding the configured one
    pub endpoint: Option<String>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` takes precedence over [`log_level`](Self::log_level).
    /// Output goes to stderr so it never mixes with command output.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(self.log_level.as_deref().unwrap_or("warn"))
        });

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Dependency-aware hydration and rendering of dashboard template variables.
#[derive(Parser, Debug)]
#[command(name = "tempvar", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Default query endpoint
    #[arg(long, global = true, value_name = "URL", env = "TEMPVAR_ENDPOINT")]
    endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a query with template values substituted
    Render(render::RenderCommand),

    /// Fetch fresh values for every template, dependencies first
    Hydrate(hydrate::HydrateCommand),

    /// Print the template dependency graph
    Graph(graph::GraphCommand),
}

impl Cli {
    /// Execute with the configuration derived from the flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            endpoint: self.endpoint.clone(),
        }
    }

    /// Execute with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let mut engine_config = EngineConfig::load(config.config_path.clone()).await?;
        if let Some(endpoint) = config.endpoint {
            engine_config.endpoint = Some(endpoint);
        }
        debug!("Using configuration: {:?}", engine_config);

        match self.command {
            Commands::Render(cmd) => cmd.execute().await,
            Commands::Hydrate(cmd) => cmd.execute(&engine_config).await,
            Commands::Graph(cmd) => cmd.execute().await,
        }
    }
}
