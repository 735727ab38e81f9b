//! Refresh stored templates against their data sources.
//!
//! ```bash
//! tempvar hydrate --templates dashboard.json --endpoint http://localhost:8086/query
//! tempvar hydrate --templates dashboard.json --select host=srv-2 --format json > hydrated.json
//! ```
//!
//! Templates that fail keep their stored values in the JSON output; every
//! failure is reported and makes the command exit non-zero.

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use crate::cache::CachingQueryFetcher;
use crate::cli::common::{load_templates, parse_selection};
use crate::config::EngineConfig;
use crate::core::TempVarError;
use crate::models::Template;
use crate::resolver::{HydrationOutcome, hydrate_templates};
use crate::source::HttpMetaQueryRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per template
    Text,
    /// The hydrated templates as a JSON array
    Json,
}

/// Command to hydrate templates.
#[derive(Args, Debug)]
pub struct HydrateCommand {
    /// JSON file with the templates (array or dashboard export)
    #[arg(short, long)]
    templates: PathBuf,

    /// Locally select a value (repeatable)
    #[arg(short, long = "select", value_name = "NAME=VALUE", value_parser = parse_selection)]
    selections: Vec<(String, String)>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl HydrateCommand {
    pub async fn execute(self, config: &EngineConfig) -> Result<()> {
        let templates = load_templates(&self.templates).await?;

        let mut options = config.hydrate_options();
        for (name, value) in &self.selections {
            options = options.with_selection(name, value.clone());
        }

        let runner = HttpMetaQueryRunner::from_config(config)?;
        let fetcher = CachingQueryFetcher::new(runner);

        let outcome = hydrate_templates(&templates, &fetcher, &options).await?;
        let stats = fetcher.stats();
        info!("Query cache: {} hits, {} misses", stats.hits, stats.misses);

        let failures: Vec<TempVarError> = outcome.errors().cloned().collect();
        let rendered = match self.format {
            OutputFormat::Json => {
                let merged = merge_with_stored(&templates, outcome);
                serde_json::to_string_pretty(&merged)?
            }
            OutputFormat::Text => format_text(&templates, &outcome),
        };

        match &self.output {
            Some(path) => tokio::fs::write(path, format!("{rendered}\n"))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => println!("{rendered}"),
        }

        if !failures.is_empty() {
            for failure in &failures {
                eprintln!("{} {}", "error:".red().bold(), failure);
            }
            bail!("{} of {} templates failed to hydrate", failures.len(), templates.len());
        }

        Ok(())
    }
}

/// Hydrated templates where available, the stored ones otherwise.
fn merge_with_stored(stored: &[Template], outcome: HydrationOutcome) -> Vec<Template> {
    stored
        .iter()
        .zip(outcome.into_results())
        .map(|(original, result)| result.unwrap_or_else(|_| original.clone()))
        .collect()
}

fn format_text(stored: &[Template], outcome: &HydrationOutcome) -> String {
    stored
        .iter()
        .zip(outcome.results())
        .map(|(original, result)| match result {
            Ok(template) => {
                let active = template.active_value().map_or("-", |v| v.value.as_str());
                format!(
                    "{} {} = {} ({} values)",
                    "✓".green(),
                    template.temp_var.bold(),
                    active,
                    template.values.len()
                )
            }
            Err(e) => format!("{} {} {}", "✗".red(), original.temp_var.bold(), e.to_string().red()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
