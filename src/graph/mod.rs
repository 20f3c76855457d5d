//! Causal graphs
//!
//! ## Table of Contents
//! - **Endpoint / Edge**: Edge marks (tail, arrow, circle) and edges between node indices
//! - **GraphNode**: Named node with an optional layout position
//! - **Graph**: Nodes plus edges, with parent lookup and circular layout
//! - **text**: Reader/writer for the plain-text graph format

pub mod text;

use crate::error::{CausalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::fmt;

pub use text::{parse_graph, read_graph, write_graph};

/// Mark at one end of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// `-`
    Tail,
    /// `>` or `<`
    Arrow,
    /// `o`
    Circle,
}

/// Edge between two node indices
///
/// `endpoint1` sits at `from`, `endpoint2` at `to`; `X --> Y` is
/// `Tail` at X and `Arrow` at Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// First node
    pub from: usize,
    /// Second node
    pub to: usize,
    /// Mark at `from`
    pub endpoint1: Endpoint,
    /// Mark at `to`
    pub endpoint2: Endpoint,
}

impl Edge {
    /// `from --> to`
    pub fn directed(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            endpoint1: Endpoint::Tail,
            endpoint2: Endpoint::Arrow,
        }
    }

    /// `a --- b`
    pub fn undirected(a: usize, b: usize) -> Self {
        Self {
            from: a,
            to: b,
            endpoint1: Endpoint::Tail,
            endpoint2: Endpoint::Tail,
        }
    }

    /// If the edge is directed, its (tail, head) pair
    pub fn direction(&self) -> Option<(usize, usize)> {
        match (self.endpoint1, self.endpoint2) {
            (Endpoint::Tail, Endpoint::Arrow) => Some((self.from, self.to)),
            (Endpoint::Arrow, Endpoint::Tail) => Some((self.to, self.from)),
            _ => None,
        }
    }

    /// Three-character symbol, e.g. `-->` or `o-o`
    pub fn symbol(&self) -> String {
        let left = match self.endpoint1 {
            Endpoint::Tail => '-',
            Endpoint::Arrow => '<',
            Endpoint::Circle => 'o',
        };
        let right = match self.endpoint2 {
            Endpoint::Tail => '-',
            Endpoint::Arrow => '>',
            Endpoint::Circle => 'o',
        };
        format!("{}-{}", left, right)
    }

    /// Whether the edge touches `node`
    pub fn touches(&self, node: usize) -> bool {
        self.from == node || self.to == node
    }
}

/// A named node with an optional layout position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node name, unique within a graph
    pub name: String,
    /// Layout position (x, y), set by a layout pass
    pub position: Option<(f64, f64)>,
}

/// A graph over named nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with the given nodes and no edges
    pub fn with_nodes<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut graph = Self::new();
        for name in names {
            graph.add_node(name.as_ref())?;
        }
        Ok(graph)
    }

    /// Add a node, returning its index
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<usize> {
        let name = name.into();
        if self.node_index(&name).is_some() {
            return Err(CausalError::config(format!("duplicate node '{}'", name)));
        }
        self.nodes.push(GraphNode {
            name,
            position: None,
        });
        Ok(self.nodes.len() - 1)
    }

    /// Add an edge; both ends must exist, self loops and parallel edges are rejected
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        let n = self.nodes.len();
        for index in [edge.from, edge.to] {
            if index >= n {
                return Err(CausalError::IndexOutOfRange {
                    index,
                    len: n,
                    what: "graph nodes",
                });
            }
        }
        if edge.from == edge.to {
            return Err(CausalError::config(format!(
                "self loop on '{}'",
                self.nodes[edge.from].name
            )));
        }
        if self.adjacent(edge.from, edge.to) {
            return Err(CausalError::config(format!(
                "'{}' and '{}' are already adjacent",
                self.nodes[edge.from].name, self.nodes[edge.to].name
            )));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Add `from --> to` by node name
    pub fn add_directed_edge(&mut self, from: &str, to: &str) -> Result<()> {
        let from = self.require(from)?;
        let to = self.require(to)?;
        self.add_edge(Edge::directed(from, to))
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.node_index(name)
            .ok_or_else(|| CausalError::UnknownVariable(name.to_string()))
    }

    /// Index of the node with this name
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Nodes, in insertion order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges, in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Whether any edge joins `a` and `b`
    pub fn adjacent(&self, a: usize, b: usize) -> bool {
        self.edges
            .iter()
            .any(|e| (e.from == a && e.to == b) || (e.from == b && e.to == a))
    }

    /// Tails of directed edges pointing into `node`
    pub fn parents(&self, node: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter_map(Edge::direction)
            .filter(|&(_, head)| head == node)
            .map(|(tail, _)| tail)
            .collect()
    }

    /// Heads of directed edges leaving `node`
    pub fn children(&self, node: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter_map(Edge::direction)
            .filter(|&(tail, _)| tail == node)
            .map(|(_, head)| head)
            .collect()
    }

    /// Whether every edge is directed and there is no directed cycle
    pub fn is_directed_acyclic(&self) -> bool {
        if self.edges.iter().any(|e| e.direction().is_none()) {
            return false;
        }
        self.topological_order().is_some()
    }

    /// Topological order over the directed edges, `None` on a cycle
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        for (_, head) in self.edges.iter().filter_map(Edge::direction) {
            in_degree[head] += 1;
        }
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for child in self.children(node) {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }
        (order.len() == n).then_some(order)
    }

    /// Place nodes evenly on a circle, node `i` of `n` at angle `2πi/n`
    pub fn circular_layout(&mut self, center_x: f64, center_y: f64, radius: f64) {
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let angle = 2.0 * PI * i as f64 / n as f64;
            node.position = Some((
                center_x + radius * angle.cos(),
                center_y + radius * angle.sin(),
            ));
        }
    }

    /// Whether every node has a layout position
    pub fn is_laid_out(&self) -> bool {
        self.nodes.iter().all(|n| n.position.is_some())
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&text::to_text(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Graph {
        let mut g = Graph::with_nodes(&["X1", "X2", "X3"]).unwrap();
        g.add_directed_edge("X1", "X2").unwrap();
        g.add_directed_edge("X2", "X3").unwrap();
        g
    }

    #[test]
    fn test_parents_and_children() {
        let g = chain();
        assert_eq!(g.parents(1), vec![0]);
        assert_eq!(g.children(1), vec![2]);
        assert!(g.parents(0).is_empty());
    }

    #[test]
    fn test_reversed_marks_count_as_directed() {
        let mut g = Graph::with_nodes(&["A", "B"]).unwrap();
        g.add_edge(Edge {
            from: 0,
            to: 1,
            endpoint1: Endpoint::Arrow,
            endpoint2: Endpoint::Tail,
        })
        .unwrap();
        assert_eq!(g.parents(0), vec![1]);
        assert_eq!(g.edges()[0].symbol(), "<--");
    }

    #[test]
    fn test_add_edge_rejections() {
        let mut g = chain();
        assert!(g.add_edge(Edge::directed(0, 0)).is_err());
        assert!(g.add_edge(Edge::directed(1, 0)).is_err());
        assert!(g.add_edge(Edge::directed(0, 9)).is_err());
        assert!(g.add_directed_edge("X1", "Nope").is_err());
        assert!(g.add_node("X1").is_err());
    }

    #[test]
    fn test_acyclicity() {
        let mut g = chain();
        assert!(g.is_directed_acyclic());
        assert_eq!(g.topological_order(), Some(vec![0, 1, 2]));

        g.add_directed_edge("X3", "X1").unwrap();
        assert!(!g.is_directed_acyclic());

        let mut u = Graph::with_nodes(&["A", "B"]).unwrap();
        u.add_edge(Edge::undirected(0, 1)).unwrap();
        assert!(!u.is_directed_acyclic());
    }

    #[test]
    fn test_circular_layout_is_deterministic() {
        let mut g = Graph::with_nodes(&["A", "B", "C", "D"]).unwrap();
        g.circular_layout(225.0, 200.0, 150.0);
        assert!(g.is_laid_out());

        let (x0, y0) = g.nodes()[0].position.unwrap();
        assert!((x0 - 375.0).abs() < 1e-9);
        assert!((y0 - 200.0).abs() < 1e-9);

        let (x1, y1) = g.nodes()[1].position.unwrap();
        assert!((x1 - 225.0).abs() < 1e-9);
        assert!((y1 - 350.0).abs() < 1e-9);

        let mut again = g.clone();
        again.circular_layout(225.0, 200.0, 150.0);
        assert_eq!(again, g);
    }
}
