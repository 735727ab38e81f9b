//! Scripted metadata query runner.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::core::{Result, TempVarError};
use crate::source::meta_query::value_column_for;
use crate::source::{MetaQueryResponse, MetaQueryRunner};

/// A [`MetaQueryRunner`] answering from a fixed table.
///
/// Responses are keyed by the exact query text the runner receives, so tests
/// assert on rendered queries implicitly. Unknown queries get an empty
/// response. Every call is recorded together with the peak number of calls
/// running at the same time.
#[derive(Debug, Default)]
pub struct CountingRunner {
    responses: HashMap<String, MetaQueryResponse>,
    failures: HashMap<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    log: Mutex<Vec<(String, String)>>,
}

impl CountingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `response`.
    #[must_use]
    pub fn with_response(mut self, query: &str, response: MetaQueryResponse) -> Self {
        self.responses.insert(query.to_string(), response);
        self
    }

    /// Answer `query` with `values` in the column its statement kind reads.
    #[must_use]
    pub fn with_values(self, query: &str, values: &[&str]) -> Self {
        let column = value_column_for(query).unwrap_or("value");
        self.with_response(query, MetaQueryResponse::single_column(column, values.iter().copied()))
    }

    /// Fail `query` as if the transport broke.
    #[must_use]
    pub fn with_failure(mut self, query: &str, message: &str) -> Self {
        self.failures.insert(query.to_string(), message.to_string());
        self
    }

    /// Sleep this long inside every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every `(endpoint, query)` received, in call order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Every query received, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.requests().into_iter().map(|(_, query)| query).collect()
    }
}

#[async_trait]
impl MetaQueryRunner for CountingRunner {
    async fn run_meta_query(&self, endpoint: &str, query: &str) -> Result<MetaQueryResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((endpoint.to_string(), query.to_string()));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = self.failures.get(query) {
            return Err(TempVarError::MetaQueryError {
                query: query.to_string(),
                message: message.clone(),
            });
        }

        Ok(self.responses.get(query).cloned().unwrap_or_default())
    }
}
