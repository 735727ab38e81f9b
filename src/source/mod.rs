//! Data sources that execute metadata queries.
//!
//! The engine never talks to a database directly. Every query goes through a
//! [`MetaQueryRunner`], which sends the text to an endpoint and hands back the
//! raw [`MetaQueryResponse`]. The caching fetcher in [`crate::cache`] turns
//! responses into value lists and is the only caller of a runner during
//! hydration.
//!
//! # Components
//!
//! - [`MetaQueryRunner`] - The execution contract, implemented by transports and test mocks
//! - [`HttpMetaQueryRunner`] - Runs queries against an InfluxDB-compatible `/query` endpoint
//! - [`meta_query`] - Response types and value extraction

pub mod meta_query;

pub use meta_query::{MetaQueryResponse, Series, StatementResult, parse_meta_query};

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::EngineConfig;
use crate::core::{Result, TempVarError};

/// Executes metadata queries against a data source endpoint.
///
/// Implementations own their transport policy (timeouts, authentication);
/// the engine adds none of its own.
#[async_trait]
pub trait MetaQueryRunner: Send + Sync {
    /// Run `query` against `endpoint` and return the unparsed response.
    async fn run_meta_query(&self, endpoint: &str, query: &str) -> Result<MetaQueryResponse>;
}

#[async_trait]
impl<R: MetaQueryRunner + ?Sized> MetaQueryRunner for Arc<R> {
    async fn run_meta_query(&self, endpoint: &str, query: &str) -> Result<MetaQueryResponse> {
        (**self).run_meta_query(endpoint, query).await
    }
}

/// Runs metadata queries over HTTP.
///
/// Issues `GET <endpoint>?q=<query>[&db=<database>]` and decodes the JSON body.
#[derive(Debug, Clone)]
pub struct HttpMetaQueryRunner {
    http: Client,
    database: Option<String>,
}

impl HttpMetaQueryRunner {
    /// Create a runner with the given request timeout and optional default database.
    pub fn new(timeout: Duration, database: Option<String>) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| TempVarError::Other {
            message: format!("failed to create HTTP client: {e}"),
        })?;

        Ok(Self {
            http,
            database,
        })
    }

    /// Create a runner from the loaded configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.request_timeout(), config.database.clone())
    }
}

#[async_trait]
impl MetaQueryRunner for HttpMetaQueryRunner {
    async fn run_meta_query(&self, endpoint: &str, query: &str) -> Result<MetaQueryResponse> {
        debug!("Running meta query against {}: {}", endpoint, query);

        let mut request = self.http.get(endpoint).query(&[("q", query)]);
        if let Some(db) = &self.database {
            request = request.query(&[("db", db.as_str())]);
        }

        let response = request.send().await.map_err(|e| TempVarError::MetaQueryError {
            query: query.to_string(),
            message: format!("request to {endpoint} failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // error bodies usually carry {"error": "..."}
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| body.chars().take(200).collect());

            return Err(TempVarError::MetaQueryError {
                query: query.to_string(),
                message: format!("HTTP {status}: {message}"),
            });
        }

        response.json::<MetaQueryResponse>().await.map_err(|e| TempVarError::MalformedResponse {
            query: query.to_string(),
            reason: e.to_string(),
        })
    }
}
