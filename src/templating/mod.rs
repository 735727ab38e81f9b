//! Materialization of stored queries for execution.
//!
//! A stored query references templates by token (`:host:`). Before it can be
//! sent to a data source every token with an active value is replaced, and
//! the built-in `:interval:` macro is expanded from the dashboard time range.
//!
//! # Quoting
//!
//! InfluxQL distinguishes identifiers (`"cpu"`) from string literals
//! (`'srv-1'`), and regex literals (`/srv-.*/`) take neither. The renderer
//! picks the form from the kind of the substituted value:
//!
//! ```text
//! SELECT * FROM :database: WHERE host =~ /:host:-[0-9]+/ AND region = :region:
//!   database = telegraf (database), host = srv (tag value), region = north (tag value)
//! SELECT * FROM "telegraf" WHERE host =~ /srv-[0-9]+/ AND region = 'north'
//! ```
//!
//! # Components
//!
//! - [`template_replace`] - Render a query against a set of templates
//! - [`render_template`] - Substitute one template
//! - [`internal_replace`] - Fill the editor slots of a template's own query
//! - [`replace_interval`] - Expand `:interval:`

pub mod builtins;
pub mod renderer;

pub use builtins::{compute_interval, internal_replace, replace_interval};
pub use renderer::{render_template, replace_all_regex, template_replace};

use crate::core::Result;
use crate::models::Template;

/// Render `query` against `templates` and, when a time range is known, expand
/// `:interval:` for it.
///
/// # Errors
///
/// See [`template_replace`].
pub fn render_query(query: &str, templates: &[Template], duration_ms: Option<u64>) -> Result<String> {
    let rendered = template_replace(query, templates)?;
    Ok(match duration_ms {
        Some(duration_ms) => replace_interval(&rendered, duration_ms),
        None => rendered,
    })
}
