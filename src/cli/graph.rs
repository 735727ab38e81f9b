//! Display the dependency structure of stored templates.
//!
//! ```bash
//! tempvar graph --templates dashboard.json            # tree per root template
//! tempvar graph --templates dashboard.json --order    # hydration order
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::common::load_templates;
use crate::models::Template;
use crate::resolver::TemplateGraph;

/// Command to print the template dependency graph.
#[derive(Args, Debug)]
pub struct GraphCommand {
    /// JSON file with the templates (array or dashboard export)
    #[arg(short, long)]
    templates: PathBuf,

    /// Print templates in hydration order instead of as a tree
    #[arg(long)]
    order: bool,
}

impl GraphCommand {
    pub async fn execute(self) -> Result<()> {
        let templates = load_templates(&self.templates).await?;
        print!("{}", describe(&templates, self.order)?);
        Ok(())
    }
}

fn describe(templates: &[Template], order: bool) -> Result<String> {
    let graph = TemplateGraph::from_templates(templates)?;

    if !order {
        return Ok(graph.to_tree_string());
    }

    Ok(graph
        .sorted_templates()
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {} ({})\n", i + 1, t.temp_var, t.template_type))
        .collect())
}
