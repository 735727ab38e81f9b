//! Dependency resolution and hydration of template variables.
//!
//! Templates reference each other through `:name:` tokens, either in their
//! query text (a tag-value list filtered by the chosen measurement) or in
//! their literal values (a map value `AND host = ':host:'`). Before a
//! template's query can run, every template it references must hold its
//! final values. This module works out that order and drives the fetches.
//!
//! # Architecture Overview
//!
//! ```text
//! templates ─► name_extractor ─► dependency_graph ─► cycle check ─► hydration ─► hydrated templates
//!                                                                     │    ▲
//!                                                    CachingQueryFetcher   value_resolver
//! ```
//!
//! - [`name_extractor`] - Finds the `:name:` tokens a template depends on
//! - [`dependency_graph`] - Builds the graph, detects cycles, sorts topologically
//! - [`value_resolver`] - Turns fresh query results into flagged candidate values
//! - [`hydration`] - Resolves the whole set from the leaves outward, concurrently
//!
//! # Error Handling
//!
//! Structural problems (an unterminated reference, a dependency cycle) abort
//! a hydration pass before any query runs. Fetch failures are reported per
//! template and only spread to the templates that depend on the failed one.
//!
//! # Example
//!
//! ```rust,no_run
//! use tempvar_engine::cache::CachingQueryFetcher;
//! use tempvar_engine::resolver::{HydrateOptions, hydrate_templates};
//! use tempvar_engine::source::HttpMetaQueryRunner;
//! use std::time::Duration;
//!
//! # async fn example(templates: Vec<tempvar_engine::models::Template>) -> anyhow::Result<()> {
//! let runner = HttpMetaQueryRunner::new(Duration::from_secs(30), None)?;
//! let fetcher = CachingQueryFetcher::new(runner);
//! let options = HydrateOptions::new().with_endpoint("http://localhost:8086/query");
//!
//! let hydrated = hydrate_templates(&templates, &fetcher, &options).await?.into_templates()?;
//! # Ok(())
//! # }
//! ```

pub mod dependency_graph;
pub mod hydration;
pub mod name_extractor;
pub mod value_resolver;

pub use dependency_graph::{NodeStatus, TemplateGraph, TemplateNode};
pub use hydration::{HydrateOptions, HydrationOutcome, hydrate_template, hydrate_templates};
pub use name_extractor::{dependency_names, extract_names};
pub use value_resolver::resolve_values;

use crate::core::Result;
use crate::models::Template;

/// Templates ordered so that every template comes after the templates it references.
///
/// # Errors
///
/// Returns [`TempVarError::MalformedReference`](crate::core::TempVarError::MalformedReference)
/// or [`TempVarError::CyclicDependency`](crate::core::TempVarError::CyclicDependency).
pub fn topological_sort(templates: &[Template]) -> Result<Vec<Template>> {
    let graph = TemplateGraph::from_templates(templates)?;
    Ok(graph.sorted_templates().into_iter().cloned().collect())
}
