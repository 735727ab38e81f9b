//! Error handling for the template-variable engine
//!
//! This module provides the error types and user-facing error reporting for the
//! engine. Two principles drive its design:
//! 1. **Strongly-typed errors** so callers can react to a specific failure mode
//! 2. **Actionable messages** that always name the offending template token or query
//!
//! # Architecture
//!
//! - [`TempVarError`] - Enumerated error kinds for every failure in the engine
//! - [`ErrorContext`] - Wrapper adding suggestions and details for CLI display
//!
//! # Error Categories
//!
//! - **Structural** (raised before any network work): [`TempVarError::MalformedReference`],
//!   [`TempVarError::CyclicDependency`]
//! - **Per node** (raised during hydration): [`TempVarError::FetchFailed`],
//!   [`TempVarError::DependencyFailed`], [`TempVarError::MissingEndpoint`],
//!   [`TempVarError::UnsupportedQueryLanguage`]
//! - **Rendering**: [`TempVarError::UnmatchedRegexDelimiter`]
//! - **Meta-query responses**: [`TempVarError::MetaQueryError`], [`TempVarError::MalformedResponse`]
//! - **Environment**: [`TempVarError::ConfigError`], [`TempVarError::Io`], [`TempVarError::Json`],
//!   [`TempVarError::Other`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use tempvar_engine::core::{TempVarError, user_friendly_error};
//!
//! let error = TempVarError::CyclicDependency {
//!     temp_var: ":host:".to_string(),
//!     chain: ":host: → :region: → :host:".to_string(),
//! };
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for engine operations.
///
/// Every variant carries owned strings so errors can be cloned into the
/// per-node results of a hydration pass and shared between dependents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TempVarError {
    /// A `:name:` reference was opened but never closed.
    ///
    /// Raised by the dependency name extractor. Graph construction never
    /// proceeds with partial data.
    #[error("malformed template variable string `{fragment}`")]
    MalformedReference {
        /// The unterminated fragment, starting at its opening colon
        fragment: String,
    },

    /// Templates reference each other in a cycle.
    #[error("cyclic dependency in template \"{temp_var}\" ({chain})")]
    CyclicDependency {
        /// Token of the template at which the cycle was detected
        temp_var: String,
        /// Human readable cycle, e.g. `:a: → :b: → :a:`
        chain: String,
    },

    /// The metadata query for a template could not be executed or parsed.
    #[error("failed to fetch values for template \"{temp_var}\" from {endpoint}: {reason}")]
    FetchFailed {
        /// Token of the template whose query failed
        temp_var: String,
        /// Endpoint the query was sent to
        endpoint: String,
        /// Underlying transport or parser failure
        reason: String,
    },

    /// A template could not be hydrated because one of its dependencies failed.
    #[error("template \"{temp_var}\" depends on \"{dependency}\", which failed to hydrate")]
    DependencyFailed {
        /// Token of the template that was skipped
        temp_var: String,
        /// Token of the failed dependency
        dependency: String,
    },

    /// A query-backed template has no endpoint to run its query against.
    #[error("no data source endpoint available for template \"{temp_var}\"")]
    MissingEndpoint {
        /// Token of the template without an endpoint
        temp_var: String,
    },

    /// A template's stored query is written in a language the engine cannot run.
    #[error("template \"{temp_var}\" uses a {language} query, which cannot be hydrated")]
    UnsupportedQueryLanguage {
        /// Token of the template carrying the query
        temp_var: String,
        /// Name of the query language, e.g. `flux`
        language: String,
    },

    /// A `/` regex literal opened after `=~` or `!~` is never closed.
    #[error("expected token '/' in '{tail}'")]
    UnmatchedRegexDelimiter {
        /// Remainder of the query from the point the delimiter was expected
        tail: String,
    },

    /// The data source reported an error for a metadata query.
    #[error("meta query `{query}` failed: {message}")]
    MetaQueryError {
        /// The query that was executed
        query: String,
        /// Error message reported by the data source
        message: String,
    },

    /// The metadata query response did not have the expected tabular shape.
    #[error("malformed response for meta query `{query}`: {reason}")]
    MalformedResponse {
        /// The query that was executed
        query: String,
        /// What was wrong with the response
        reason: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// File system failure.
    #[error("I/O error: {reason}")]
    Io {
        /// Rendered [`std::io::Error`]
        reason: String,
    },

    /// JSON (de)serialization failure.
    #[error("JSON error: {reason}")]
    Json {
        /// Rendered [`serde_json::Error`]
        reason: String,
    },

    /// Any other failure, already rendered.
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl From<std::io::Error> for TempVarError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TempVarError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            reason: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TempVarError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: err.to_string(),
        }
    }
}

impl TempVarError {
    /// Returns `true` for errors detected before any query is executed.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MalformedReference { .. } | Self::CyclicDependency { .. })
    }

    /// Token of the template this error is attributed to, if any.
    pub fn temp_var(&self) -> Option<&str> {
        match self {
            Self::CyclicDependency {
                temp_var,
                ..
            }
            | Self::FetchFailed {
                temp_var,
                ..
            }
            | Self::DependencyFailed {
                temp_var,
                ..
            }
            | Self::MissingEndpoint {
                temp_var,
            }
            | Self::UnsupportedQueryLanguage {
                temp_var,
                ..
            } => Some(temp_var),
            _ => None,
        }
    }
}

/// Engine result alias.
pub type Result<T, E = TempVarError> = std::result::Result<T, E>;

/// Error wrapper with a suggestion and details for terminal display.
///
/// ```rust,no_run
/// use tempvar_engine::core::{ErrorContext, TempVarError};
///
/// let context = ErrorContext::new(TempVarError::MissingEndpoint {
///     temp_var: ":host:".to_string(),
/// })
/// .with_suggestion("Pass --endpoint or set `endpoint` in the config file");
///
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: TempVarError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: TempVarError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error. Displayed in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error. Displayed in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with an actionable suggestion.
///
/// Recognizes [`TempVarError`] anywhere in the `anyhow` chain, then I/O,
/// TOML and JSON errors. Anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(engine_error) = error.chain().find_map(|e| e.downcast_ref::<TempVarError>()) {
        return create_error_context(engine_error.clone());
    }

    // context layers carry the file path, so keep the whole chain
    let message =
        error.chain().map(std::string::ToString::to_string).collect::<Vec<_>>().join(": ");

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let ctx = ErrorContext::new(TempVarError::Io {
            reason: message,
        });
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ctx
                .with_suggestion("Check that the templates file exists and the path is correct"),
            std::io::ErrorKind::PermissionDenied => {
                ctx.with_suggestion("Check the file permissions of the templates or config file")
            }
            _ => ctx,
        };
    }

    if error.downcast_ref::<toml::de::Error>().is_some() {
        return ErrorContext::new(TempVarError::ConfigError {
            message,
        })
        .with_suggestion("Check the TOML syntax of your config file");
    }

    if error.downcast_ref::<serde_json::Error>().is_some() {
        return ErrorContext::new(TempVarError::Json {
            reason: message,
        })
        .with_suggestion("Template files must hold a JSON array of templates or an object with a `templates` array");
    }

    ErrorContext::new(TempVarError::Other {
        message,
    })
}

fn create_error_context(error: TempVarError) -> ErrorContext {
    match &error {
        TempVarError::MalformedReference {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Close every template variable reference with a second colon, e.g. `:host:`")
            .with_details("Template variable names are written between two colons and cannot contain line breaks"),
        TempVarError::CyclicDependency {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove one of the references so the templates no longer depend on each other in a loop"),
        TempVarError::FetchFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that the data source is reachable and the template query is valid"),
        TempVarError::DependencyFailed {
            dependency,
            ..
        } => {
            let suggestion = format!("Fix template \"{dependency}\" first");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        TempVarError::MissingEndpoint {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass --endpoint or set `endpoint` (or a matching `sources` entry) in the config file"),
        TempVarError::UnsupportedQueryLanguage {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Store an `influxql` query for this template; its stored values are kept meanwhile"),
        TempVarError::UnmatchedRegexDelimiter {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Close the regular expression with a trailing '/'")
            .with_details("Regular expressions follow `=~` or `!~` and are delimited by '/'"),
        TempVarError::ConfigError {
            ..
        } => ErrorContext::new(error).with_suggestion("Check the config file at ~/.tempvar/config.toml"),
        _ => ErrorContext::new(error),
    }
}
