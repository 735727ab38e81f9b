//! Render a query against stored templates.
//!
//! ```bash
//! tempvar render --templates dashboard.json \
//!     --query 'SELECT mean(usage) FROM cpu WHERE host = :host: GROUP BY time(:interval:)' \
//!     --interval-ms 3600000
//! ```
//!
//! Templates are used as stored; run `tempvar hydrate` first to refresh them.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::common::{load_templates, parse_selection};
use crate::models::{Template, reference_token};
use crate::resolver::resolve_values;
use crate::templating::render_query;

/// Command to render a query with template values substituted.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// JSON file with the templates (array or dashboard export)
    #[arg(short, long)]
    templates: PathBuf,

    /// Query text to render
    #[arg(short = 'Q', long)]
    query: String,

    /// Dashboard time range in milliseconds, used to expand `:interval:`
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Locally select a value before rendering (repeatable)
    #[arg(short, long = "select", value_name = "NAME=VALUE", value_parser = parse_selection)]
    selections: Vec<(String, String)>,
}

impl RenderCommand {
    pub async fn execute(self) -> Result<()> {
        let mut templates = load_templates(&self.templates).await?;
        apply_selections(&mut templates, &self.selections);

        debug!("Rendering against {} templates", templates.len());
        let rendered = render_query(&self.query, &templates, self.interval_ms)
            .with_context(|| format!("Failed to render query: {}", self.query))?;

        println!("{rendered}");
        Ok(())
    }
}

/// Move the local selection of each named template to the requested value.
///
/// Only values the template already holds can be selected; other requests
/// leave the template unchanged.
fn apply_selections(templates: &mut [Template], selections: &[(String, String)]) {
    for (name, value) in selections {
        let token = reference_token(name);
        let Some(template) = templates.iter_mut().find(|t| t.temp_var == token) else {
            debug!("Ignoring selection for unknown template {}", token);
            continue;
        };

        let current: Vec<String> = template.values.iter().map(|v| v.value.clone()).collect();
        let resolved = resolve_values(template, Some(&current), Some(value));
        if !resolved.is_empty() {
            template.values = resolved;
        }
    }
}
