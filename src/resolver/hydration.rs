//! Hydration of a template set: fetching fresh values in dependency order.
//!
//! # Algorithm
//!
//! 1. Build the [`TemplateGraph`] and reject cycles. Malformed references and
//!    cycles fail the whole pass before any query is sent.
//! 2. Start every leaf at once.
//! 3. Whenever a node finishes, start each parent whose children are now all
//!    `Done`. Its query is rendered against every template hydrated so far.
//! 4. A failed node fails its transitive parents with
//!    [`TempVarError::DependencyFailed`]; unrelated branches keep going.
//!
//! ```text
//! wave 1: :db:  :region:          (leaves, concurrently)
//! wave 2: :meas:                  (after :db:)
//! wave 3: :host:                  (after :db: and :meas:)
//! ```
//!
//! Concurrency is bounded only by the fan-out of the graph. All in-flight
//! work lives in one `FuturesUnordered` polled by the caller's task, so
//! dropping the returned future abandons the pass without leaving anything
//! running.

use futures::stream::{FuturesUnordered, StreamExt};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, warn};

use crate::cache::CachingQueryFetcher;
use crate::core::{Result, TempVarError};
use crate::models::{Template, reference_token};
use crate::resolver::dependency_graph::{NodeStatus, TemplateGraph};
use crate::resolver::value_resolver::resolve_values;
use crate::source::MetaQueryRunner;
use crate::templating::{internal_replace, template_replace};

/// Inputs of a hydration pass besides the templates themselves.
#[derive(Debug, Clone, Default)]
pub struct HydrateOptions {
    /// Endpoint for templates without a resolvable `source_id`
    pub endpoint: Option<String>,
    /// Endpoints by source id
    pub sources: HashMap<String, String>,
    /// Values to select locally, by template token
    pub selections: HashMap<String, String>,
}

impl HydrateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.sources.insert(id.into(), endpoint.into());
        self
    }

    /// Ask for `value` to be locally selected in template `name`.
    ///
    /// `name` is either a bare name (`host`) or a full token (`:my var:`),
    /// see [`reference_token`].
    #[must_use]
    pub fn with_selection(mut self, name: &str, value: impl Into<String>) -> Self {
        self.selections.insert(reference_token(name), value.into());
        self
    }

    /// The endpoint `template`'s query runs against.
    ///
    /// A `source_id` registered in [`sources`](Self::sources) wins over the
    /// default endpoint.
    pub fn endpoint_for(&self, template: &Template) -> Option<&str> {
        template
            .source_id
            .as_ref()
            .and_then(|id| self.sources.get(id))
            .or(self.endpoint.as_ref())
            .map(String::as_str)
    }

    fn selection_for(&self, template: &Template) -> Option<&str> {
        self.selections.get(&template.temp_var).map(String::as_str)
    }
}

/// Per-template results of a hydration pass, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationOutcome {
    results: Vec<Result<Template>>,
}

impl HydrationOutcome {
    pub fn results(&self) -> &[Result<Template>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Result<Template>> {
        self.results
    }

    /// Whether every template hydrated.
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    /// Errors of the templates that failed, in input order.
    pub fn errors(&self) -> impl Iterator<Item = &TempVarError> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    /// The hydrated templates, or the first error in input order.
    pub fn into_templates(self) -> Result<Vec<Template>> {
        self.results.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Hydrate a single template.
///
/// Query-backed templates render their query (editor slots first, then
/// `resolved`), fetch it through `fetcher` and resolve the fresh values.
/// Literal templates only have their selection flags normalized. Either way
/// the caller's selection hint from `options` applies.
///
/// # Errors
///
/// - [`TempVarError::MissingEndpoint`] when a query has nowhere to run
/// - [`TempVarError::UnsupportedQueryLanguage`] when only a Flux script is stored
/// - [`TempVarError::UnmatchedRegexDelimiter`] when the query cannot be rendered
/// - [`TempVarError::FetchFailed`] wrapping any runner or parser failure
pub async fn hydrate_template<R: MetaQueryRunner>(
    template: &Template,
    resolved: &[Template],
    fetcher: &CachingQueryFetcher<R>,
    options: &HydrateOptions,
) -> Result<Template> {
    let hint = options.selection_for(template);

    if template.template_type.is_query_backed()
        && template.query_text().is_none()
        && template.flux_text().is_some()
    {
        return Err(TempVarError::UnsupportedQueryLanguage {
            temp_var: template.temp_var.clone(),
            language: "flux".to_string(),
        });
    }

    let fresh = match template.query_text() {
        Some(_) if template.template_type.is_query_backed() => {
            let endpoint = options.endpoint_for(template).ok_or_else(|| {
                TempVarError::MissingEndpoint {
                    temp_var: template.temp_var.clone(),
                }
            })?;

            let query = template_replace(&internal_replace(template), resolved)?;
            debug!("Hydrating {} with `{}`", template.temp_var, query);

            let values = fetcher.fetch(endpoint, &query).await.map_err(|e| {
                TempVarError::FetchFailed {
                    temp_var: template.temp_var.clone(),
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            })?;
            Some(values)
        }
        _ => None,
    };

    let mut hydrated = template.clone();
    hydrated.values = resolve_values(template, fresh.as_deref(), hint);
    Ok(hydrated)
}

/// Hydrate every template, dependencies first.
///
/// # Errors
///
/// The outer error is structural ([`TempVarError::MalformedReference`],
/// [`TempVarError::CyclicDependency`]) and is raised before any query runs.
/// Per-template failures are reported inside the [`HydrationOutcome`].
pub async fn hydrate_templates<R: MetaQueryRunner>(
    templates: &[Template],
    fetcher: &CachingQueryFetcher<R>,
    options: &HydrateOptions,
) -> Result<HydrationOutcome> {
    let mut graph = TemplateGraph::from_templates(templates)?;

    if let Some(endpoint) = &options.endpoint {
        fetcher.bind_endpoint(endpoint);
    }

    info!("Hydrating {} templates", graph.node_count());

    let mut results: Vec<Option<Result<Template>>> = vec![None; graph.node_count()];
    let mut in_flight = FuturesUnordered::new();

    for leaf in graph.leaves() {
        let (template, resolved) = start_node(&mut graph, leaf);
        in_flight.push(run_node(leaf, template, resolved, fetcher, options));
    }

    while let Some((index, result)) = in_flight.next().await {
        match result {
            Ok(hydrated) => {
                debug!("Hydrated {} ({} values)", hydrated.temp_var, hydrated.values.len());
                let node = graph.node_mut(index);
                node.status = NodeStatus::Done;
                node.hydrated_template = Some(hydrated.clone());
                results[index.index()] = Some(Ok(hydrated));

                let ready: Vec<NodeIndex> = graph
                    .parents(index)
                    .filter(|&parent| {
                        graph.node(parent).status == NodeStatus::NotStarted
                            && graph.children(parent).all(|c| graph.node(c).status == NodeStatus::Done)
                    })
                    .collect();

                for parent in ready {
                    let (template, resolved) = start_node(&mut graph, parent);
                    in_flight.push(run_node(parent, template, resolved, fetcher, options));
                }
            }
            Err(error) => {
                warn!("Failed to hydrate {}: {}", graph.node(index).temp_var(), error);
                graph.node_mut(index).status = NodeStatus::Failed;
                results[index.index()] = Some(Err(error));
                fail_dependents(&mut graph, index, &mut results);
            }
        }
    }

    let results = results
        .into_iter()
        .zip(templates)
        .map(|(result, template)| {
            // every node is reached from a leaf once the graph is acyclic
            result.unwrap_or_else(|| {
                Err(TempVarError::Other {
                    message: format!("template \"{}\" was never hydrated", template.temp_var),
                })
            })
        })
        .collect();

    Ok(HydrationOutcome {
        results,
    })
}

/// Mark `index` as loading and snapshot everything hydrated so far.
fn start_node(graph: &mut TemplateGraph, index: NodeIndex) -> (Template, Vec<Template>) {
    let resolved: Vec<Template> = graph
        .node_indices()
        .filter_map(|i| match graph.node(i).status {
            NodeStatus::Done => graph.node(i).hydrated_template.clone(),
            _ => None,
        })
        .collect();

    let node = graph.node_mut(index);
    node.status = NodeStatus::Loading;
    (node.initial_template.clone(), resolved)
}

async fn run_node<R: MetaQueryRunner>(
    index: NodeIndex,
    template: Template,
    resolved: Vec<Template>,
    fetcher: &CachingQueryFetcher<R>,
    options: &HydrateOptions,
) -> (NodeIndex, Result<Template>) {
    let result = hydrate_template(&template, &resolved, fetcher, options).await;
    (index, result)
}

/// Fail every transitive parent of `failed` that has not started.
fn fail_dependents(
    graph: &mut TemplateGraph,
    failed: NodeIndex,
    results: &mut [Option<Result<Template>>],
) {
    let dependency = graph.node(failed).temp_var().to_string();
    let mut queue: VecDeque<NodeIndex> = graph.parents(failed).collect();

    while let Some(parent) = queue.pop_front() {
        if graph.node(parent).status != NodeStatus::NotStarted {
            continue;
        }

        let node = graph.node_mut(parent);
        node.status = NodeStatus::Failed;
        results[parent.index()] = Some(Err(TempVarError::DependencyFailed {
            temp_var: node.temp_var().to_string(),
            dependency: dependency.clone(),
        }));

        queue.extend(graph.parents(parent));
    }
}
