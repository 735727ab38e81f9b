//! tempvar-engine - Dependency-aware hydration of dashboard template variables
//!
//! Dashboards store queries with placeholders such as `:host:` or
//! `:database:`. Each placeholder is backed by a *template* whose candidate
//! values are either literal (a CSV list, a key/value map, free text) or
//! produced by a metadata query that may itself reference other templates:
//!
//! ```text
//! :db:    SHOW DATABASES
//! :meas:  SHOW MEASUREMENTS ON :db:
//! :host:  SHOW TAG VALUES ON :db: FROM :meas: WITH KEY = "host"
//! ```
//!
//! The engine works out the order in which such templates can be resolved,
//! fetches their values with as much concurrency as the dependencies allow,
//! and renders stored queries with the chosen values correctly quoted.
//!
//! # Core Modules
//!
//! - [`models`] - Templates, values and their kinds
//! - [`resolver`] - Dependency extraction, graph, value resolution, hydration
//! - [`cache`] - Single-flight memoization of metadata queries
//! - [`source`] - The query runner contract and its HTTP implementation
//! - [`templating`] - Query rendering, editor slots and `:interval:`
//! - [`core`] - Error types and user-facing error reporting
//!
//! ## Supporting Modules
//!
//! - [`config`] - `~/.tempvar/config.toml`
//! - [`cli`] - The `tempvar` command line
//! - [`constants`] - Shared constants
//!
//! # Example
//!
//! ```rust,no_run
//! use tempvar_engine::cache::CachingQueryFetcher;
//! use tempvar_engine::config::EngineConfig;
//! use tempvar_engine::resolver::hydrate_templates;
//! use tempvar_engine::source::HttpMetaQueryRunner;
//! use tempvar_engine::templating::template_replace;
//!
//! # async fn example(templates: Vec<tempvar_engine::models::Template>) -> anyhow::Result<()> {
//! let config = EngineConfig::load(None).await?;
//! let fetcher = CachingQueryFetcher::new(HttpMetaQueryRunner::from_config(&config)?);
//!
//! let hydrated = hydrate_templates(&templates, &fetcher, &config.hydrate_options())
//!     .await?
//!     .into_templates()?;
//!
//! let query = template_replace("SELECT mean(usage_idle) FROM cpu WHERE host = :host:", &hydrated)?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod resolver;
pub mod source;
pub mod templating;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
