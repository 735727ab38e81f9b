//! Configuration management
//!
//! The engine reads one optional TOML file holding the data source endpoints
//! and the HTTP policy of the metadata query runner. Everything in it can be
//! overridden from the command line.
//!
//! # Modules
//!
//! - `engine` - [`EngineConfig`] and its file location rules

mod engine;

pub use engine::EngineConfig;
