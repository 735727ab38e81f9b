//! Dependency graph among the templates of one dashboard.
//!
//! The graph is an arena: one node per template, addressed by a stable
//! [`NodeIndex`] equal to the template's position in the input list. An edge
//! `A → B` means A references B's token, so B is a **child** of A and must be
//! resolved first. Leaves (no children) have no unresolved dependencies.
//!
//! A graph lives for a single hydration or rendering pass and is rebuilt from
//! the stored templates each time.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use super::name_extractor::dependency_names;
use crate::core::{Result, TempVarError};
use crate::models::Template;

/// Resolution state of a node during hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    NotStarted,
    Loading,
    Done,
    /// The node's own fetch failed, or one of its dependencies did.
    Failed,
}

/// One template wrapped for a hydration pass.
#[derive(Debug, Clone)]
pub struct TemplateNode {
    pub status: NodeStatus,
    /// The template as stored before hydration
    pub initial_template: Template,
    /// The template with freshly resolved values, once `Done`
    pub hydrated_template: Option<Template>,
}

impl TemplateNode {
    fn new(template: Template) -> Self {
        Self {
            status: NodeStatus::NotStarted,
            initial_template: template,
            hydrated_template: None,
        }
    }

    /// Token of the wrapped template.
    pub fn temp_var(&self) -> &str {
        &self.initial_template.temp_var
    }
}

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the current DFS path.
    Gray,
    /// Node and everything below it has been explored.
    Black,
}

/// Directed graph of template dependencies.
pub struct TemplateGraph {
    /// Edges point from a template to the templates it references.
    graph: DiGraph<TemplateNode, ()>,
}

impl TemplateGraph {
    /// Build the graph without checking for cycles.
    ///
    /// Every template becomes a node. Each extracted reference that matches
    /// another template's token becomes a child edge; references that match no
    /// template (built-in macros such as `:interval:`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TempVarError::MalformedReference`] if any template's query or
    /// literal values contain an unterminated reference.
    pub fn build(templates: &[Template]) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(templates.len(), templates.len());
        let mut by_token: HashMap<&str, Vec<NodeIndex>> = HashMap::new();

        for template in templates {
            let index = graph.add_node(TemplateNode::new(template.clone()));
            by_token.entry(template.temp_var.as_str()).or_default().push(index);
        }

        for (position, template) in templates.iter().enumerate() {
            let parent = NodeIndex::new(position);

            for name in dependency_names(template)? {
                let Some(children) = by_token.get(name.as_str()) else {
                    trace!("Reference {} in {} matches no template", name, template.temp_var);
                    continue;
                };

                for &child in children {
                    if !graph.contains_edge(parent, child) {
                        graph.add_edge(parent, child, ());
                    }
                }
            }
        }

        debug!(
            "Built template graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            graph,
        })
    }

    /// Build the graph and verify it is acyclic.
    ///
    /// # Errors
    ///
    /// Returns [`TempVarError::MalformedReference`] or
    /// [`TempVarError::CyclicDependency`].
    pub fn from_templates(templates: &[Template]) -> Result<Self> {
        let graph = Self::build(templates)?;
        graph.detect_cycles()?;
        Ok(graph)
    }

    /// Detect cycles using DFS with colors.
    ///
    /// Every node is used as a starting point, so disconnected components are
    /// all checked. Reaching a node that is on the current path is a cycle;
    /// reaching one that was fully explored through another branch is not.
    ///
    /// # Errors
    ///
    /// Returns [`TempVarError::CyclicDependency`] naming the template at which
    /// the cycle closed.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors = vec![Color::White; self.graph.node_count()];
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if colors[node.index()] == Color::White
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                let temp_var = self.graph[cycle[0]].temp_var().to_string();
                let chain = cycle
                    .iter()
                    .map(|&idx| self.graph[idx].temp_var())
                    .collect::<Vec<_>>()
                    .join(" → ");
                return Err(TempVarError::CyclicDependency {
                    temp_var,
                    chain,
                });
            }
        }

        Ok(())
    }

    /// Returns `Some(cycle)` when a cycle is reachable from `node`; the cycle
    /// starts and ends with the revisited node.
    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut [Color],
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors[node.index()] = Color::Gray;
        path.push(node);

        for child in self.children(node) {
            match colors[child.index()] {
                Color::Gray => {
                    let start = path.iter().position(|&n| n == child).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(child);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.dfs_visit(child, colors, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors[node.index()] = Color::Black;
        None
    }

    /// Order the nodes so that every node comes before all of its parents.
    ///
    /// Depth-first over the dependent (parent) edges, pushing each node once
    /// all its dependents are finished; the reversed finish order therefore
    /// lists dependencies first. Assumes the graph is acyclic.
    pub fn topological_order(&self) -> Vec<NodeIndex> {
        let mut seen = HashSet::with_capacity(self.graph.node_count());
        let mut finished = Vec::with_capacity(self.graph.node_count());

        for node in self.graph.node_indices() {
            if !seen.contains(&node) {
                self.topological_visit(node, &mut seen, &mut finished);
            }
        }

        finished.reverse();
        finished
    }

    fn topological_visit(
        &self,
        node: NodeIndex,
        seen: &mut HashSet<NodeIndex>,
        finished: &mut Vec<NodeIndex>,
    ) {
        seen.insert(node);

        for parent in self.parents(node) {
            if !seen.contains(&parent) {
                self.topological_visit(parent, seen, finished);
            }
        }

        finished.push(node);
    }

    /// Initial templates in dependency order.
    pub fn sorted_templates(&self) -> Vec<&Template> {
        self.topological_order().into_iter().map(|idx| &self.graph[idx].initial_template).collect()
    }

    /// Templates referenced by `node`.
    pub fn children(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(node, Direction::Outgoing)
    }

    /// Templates referencing `node`.
    pub fn parents(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(node, Direction::Incoming)
    }

    /// Nodes without dependencies.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().filter(|&idx| self.children(idx).next().is_none()).collect()
    }

    pub fn node(&self, index: NodeIndex) -> &TemplateNode {
        &self.graph[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut TemplateNode {
        &mut self.graph[index]
    }

    /// Node indices in input order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Render the dependencies of every root (node without parents) as a tree.
    pub fn to_tree_string(&self) -> String {
        let roots: Vec<NodeIndex> =
            self.graph.node_indices().filter(|&idx| self.parents(idx).next().is_none()).collect();

        let mut result = String::new();
        for (i, root) in roots.iter().enumerate() {
            let mut visited = HashSet::new();
            self.build_tree_string(*root, &mut result, "", i == roots.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        node: NodeIndex,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let template = &self.graph[node].initial_template;
        result.push_str(&format!(
            "{}{}{} ({})\n",
            prefix, connector, template.temp_var, template.template_type
        ));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(node) {
            result.push_str(&format!("{child_prefix}└── (circular reference)\n"));
            return;
        }

        let mut children: Vec<NodeIndex> = self.children(node).collect();
        children.sort();
        for (i, child) in children.iter().enumerate() {
            self.build_tree_string(*child, result, &child_prefix, i == children.len() - 1, visited);
        }
        visited.remove(&node);
    }
}
