//! Common utilities for CLI commands

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use crate::models::Template;

/// Accepted layouts of a template file.
#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    /// A bare JSON array of templates
    List(Vec<Template>),
    /// A dashboard export carrying a `templates` array
    Dashboard { templates: Vec<Template> },
}

/// Read templates from a JSON file.
///
/// Both a bare array and a dashboard object with a `templates` field are accepted.
pub async fn load_templates(path: &Path) -> Result<Vec<Template>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read templates from {}", path.display()))?;

    parse_templates(&content)
        .with_context(|| format!("Failed to parse templates from {}", path.display()))
}

fn parse_templates(content: &str) -> Result<Vec<Template>> {
    let file: TemplateFile = serde_json::from_str(content)?;
    Ok(match file {
        TemplateFile::List(templates) => templates,
        TemplateFile::Dashboard { templates } => templates,
    })
}

/// Parse a `name=value` selection given on the command line.
pub fn parse_selection(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}
