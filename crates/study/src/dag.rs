// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directed acyclic graph with stable node identity.
//!
//! Nodes carry a value payload and an integer id assigned at first
//! insertion. The id is the *semantic* identity: every parameterized copy of
//! a node inserted during fan-out reuses the original's id, while the name
//! is the concrete identity. The sentinel source node holds no value and
//! id −1.
//!
//! Structural violations (self-loops, missing endpoints, cycles) raise a
//! typed error; idempotent re-adds and removals of absent items log and
//! return.

use indexmap::IndexMap;
use std::collections::HashSet;
use thiserror::Error;

/// Name of the distinguished source node every root hangs from.
pub const SOURCE_NODE: &str = "_source";

/// Id of the source node.
pub const SOURCE_ID: i64 = -1;

/// Errors raised by structural graph violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("cannot add self-referring cycle edge ({node}, {node})")]
    SelfLoop { node: String },
    #[error("attempted to create edge ({src}, {dst}), but node {missing} does not exist")]
    MissingNode {
        src: String,
        dst: String,
        missing: String,
    },
    #[error("adding edge ({src}, {dst}) creates a cycle")]
    Cycle { src: String, dst: String },
}

#[derive(Debug, Clone)]
struct NodeEntry<T> {
    id: i64,
    value: Option<T>,
    successors: Vec<String>,
    predecessors: Vec<String>,
}

/// A DAG over named, value-carrying nodes.
#[derive(Debug, Clone, Default)]
pub struct Dag<T> {
    nodes: IndexMap<String, NodeEntry<T>>,
    next_id: i64,
}

impl<T> Dag<T> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            next_id: 0,
        }
    }

    /// Add a node with a fresh monotonically increasing id.
    ///
    /// Idempotent on the name: re-adding logs and keeps the existing node.
    /// Returns the node's id.
    pub fn add_node(&mut self, name: &str, value: T) -> i64 {
        let id = self.next_id;
        self.insert_node(name, Some(value), id)
    }

    /// Add a node reusing an explicit id (parameter fan-out identity).
    pub fn add_node_with_id(&mut self, name: &str, value: T, id: i64) -> i64 {
        self.insert_node(name, Some(value), id)
    }

    /// Add a valueless sentinel node with an explicit id.
    pub fn add_sentinel(&mut self, name: &str, id: i64) -> i64 {
        self.insert_node(name, None, id)
    }

    fn insert_node(&mut self, name: &str, value: Option<T>, id: i64) -> i64 {
        if let Some(existing) = self.nodes.get(name) {
            tracing::warn!(node = name, "node already exists, returning");
            return existing.id;
        }
        self.nodes.insert(
            name.to_string(),
            NodeEntry {
                id,
                value,
                successors: Vec::new(),
                predecessors: Vec::new(),
            },
        );
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        tracing::debug!(node = name, id, "node added");
        id
    }

    /// True if a node named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// The id of a node, if present.
    pub fn node_id(&self, name: &str) -> Option<i64> {
        self.nodes.get(name).map(|n| n.id)
    }

    /// The value of a node; `None` for sentinels and missing nodes.
    pub fn value(&self, name: &str) -> Option<&T> {
        self.nodes.get(name).and_then(|n| n.value.as_ref())
    }

    /// Mutable access to a node's value.
    pub fn value_mut(&mut self, name: &str) -> Option<&mut T> {
        self.nodes.get_mut(name).and_then(|n| n.value.as_mut())
    }

    /// Node names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct predecessors of a node, in edge insertion order.
    pub fn predecessors(&self, name: &str) -> Vec<String> {
        self.nodes
            .get(name)
            .map(|n| n.predecessors.clone())
            .unwrap_or_default()
    }

    /// Direct successors of a node, in edge insertion order.
    pub fn successors(&self, name: &str) -> Vec<String> {
        self.nodes
            .get(name)
            .map(|n| n.successors.clone())
            .unwrap_or_default()
    }

    /// Number of incoming edges.
    pub fn in_degree(&self, name: &str) -> usize {
        self.nodes.get(name).map(|n| n.predecessors.len()).unwrap_or(0)
    }

    /// True if an edge `(src, dst)` exists.
    pub fn has_edge(&self, src: &str, dst: &str) -> bool {
        self.nodes
            .get(src)
            .is_some_and(|n| n.successors.iter().any(|s| s == dst))
    }

    /// All edges as `(src, dst)` pairs, source-insertion ordered.
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges = Vec::new();
        for (name, entry) in &self.nodes {
            for succ in &entry.successors {
                edges.push((name.clone(), succ.clone()));
            }
        }
        edges
    }

    /// Add an edge, rejecting self-loops, missing endpoints, and cycles.
    ///
    /// Idempotent on existing edges.
    pub fn add_edge(&mut self, src: &str, dst: &str) -> Result<(), GraphError> {
        if src == dst {
            return Err(GraphError::SelfLoop {
                node: src.to_string(),
            });
        }
        for endpoint in [src, dst] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::MissingNode {
                    src: src.to_string(),
                    dst: dst.to_string(),
                    missing: endpoint.to_string(),
                });
            }
        }
        if self.has_edge(src, dst) {
            tracing::debug!(src, dst, "edge already in DAG, returning");
            return Ok(());
        }
        // The edge closes a cycle iff dst already reaches src.
        if self.reaches(dst, src) {
            return Err(GraphError::Cycle {
                src: src.to_string(),
                dst: dst.to_string(),
            });
        }
        if let Some(entry) = self.nodes.get_mut(src) {
            entry.successors.push(dst.to_string());
        }
        if let Some(entry) = self.nodes.get_mut(dst) {
            entry.predecessors.push(src.to_string());
        }
        tracing::debug!(src, dst, "edge added");
        Ok(())
    }

    /// Remove an edge; missing endpoints or edges log and return.
    pub fn remove_edge(&mut self, src: &str, dst: &str) {
        if !self.nodes.contains_key(src) || !self.nodes.contains_key(dst) {
            tracing::warn!(src, dst, "attempted to remove an edge with a missing endpoint");
            return;
        }
        if !self.has_edge(src, dst) {
            tracing::warn!(src, dst, "attempted to remove edge which does not exist");
            return;
        }
        if let Some(entry) = self.nodes.get_mut(src) {
            entry.successors.retain(|s| s != dst);
        }
        if let Some(entry) = self.nodes.get_mut(dst) {
            entry.predecessors.retain(|p| p != src);
        }
        tracing::debug!(src, dst, "edge removed");
    }

    /// Remove a node and its incident edges; a missing node logs and returns.
    pub fn remove_node(&mut self, name: &str) {
        let Some(entry) = self.nodes.shift_remove(name) else {
            tracing::warn!(node = name, "attempted to remove a node which does not exist");
            return;
        };
        for succ in entry.successors {
            if let Some(s) = self.nodes.get_mut(&succ) {
                s.predecessors.retain(|p| p != name);
            }
        }
        for pred in entry.predecessors {
            if let Some(p) = self.nodes.get_mut(&pred) {
                p.successors.retain(|s| s != name);
            }
        }
        tracing::debug!(node = name, "node removed");
    }

    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from.to_string()];
        let mut seen: HashSet<String> = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(entry) = self.nodes.get(&current) {
                stack.extend(entry.successors.iter().cloned());
            }
        }
        false
    }

    /// Topological order of all node names.
    ///
    /// Kahn's algorithm; ties break by node insertion order, so the order is
    /// deterministic for a given construction sequence.
    pub fn topological_sort(&self) -> Vec<String> {
        let mut in_degree: IndexMap<String, usize> = self
            .nodes
            .iter()
            .map(|(name, entry)| (name.clone(), entry.predecessors.len()))
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        // Kahn's algorithm; always drains while add_edge enforces acyclicity.
        while let Some(next) = in_degree
            .iter()
            .find(|(_, degree)| **degree == 0)
            .map(|(name, _)| name.clone())
        {
            in_degree.shift_remove(&next);
            for succ in self.successors(&next) {
                if let Some(degree) = in_degree.get_mut(&succ) {
                    *degree = degree.saturating_sub(1);
                }
            }
            order.push(next);
        }
        order
    }

    /// All nodes with a path to `name`, excluding `name` itself.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stack = self.predecessors(name);
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            stack.extend(self.predecessors(&current));
            result.push(current);
        }
        result
    }

    /// Length of the longest path from the source node to `name`.
    ///
    /// Only used for visualization; `None` when either node is missing or
    /// unreachable.
    pub fn tier(&self, name: &str) -> Option<usize> {
        if !self.contains(SOURCE_NODE) || !self.contains(name) {
            return None;
        }
        let mut longest: IndexMap<String, Option<usize>> =
            self.names().map(|n| (n.to_string(), None)).collect();
        longest.insert(SOURCE_NODE.to_string(), Some(0));
        for node in self.topological_sort() {
            let Some(distance) = longest.get(&node).copied().flatten() else {
                continue;
            };
            for succ in self.successors(&node) {
                let best = longest
                    .get(&succ)
                    .copied()
                    .flatten()
                    .map_or(distance + 1, |d| d.max(distance + 1));
                longest.insert(succ, Some(best));
            }
        }
        longest.get(name).copied().flatten()
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
