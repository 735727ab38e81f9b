//! Test utilities for the engine
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`init_test_logging`] - Opt-in tracing output for tests
//! - [`CountingRunner`] - Scripted [`MetaQueryRunner`](crate::source::MetaQueryRunner)
//!   that records every call
//! - [`fixtures`] - Ready-made templates
//!
//! # Example
//!
//! ```rust,no_run
//! use tempvar_engine::cache::CachingQueryFetcher;
//! use tempvar_engine::source::MetaQueryResponse;
//! use tempvar_engine::test_utils::CountingRunner;
//!
//! # async fn example() {
//! let runner = CountingRunner::new()
//!     .with_response("SHOW DATABASES", MetaQueryResponse::single_column("name", ["telegraf"]));
//! let fetcher = CachingQueryFetcher::new(runner);
//!
//! fetcher.fetch("http://localhost:8086/query", "SHOW DATABASES").await.unwrap();
//! assert_eq!(fetcher.runner().calls(), 1);
//! # }
//! ```

pub mod fixtures;
pub mod runner;

pub use runner::CountingRunner;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `None` the `RUST_LOG` environment
/// variable decides; when it is unset no subscriber is installed.
///
/// ```bash
/// RUST_LOG=tempvar_engine=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
