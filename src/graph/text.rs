//! Plain-text graph format
//!
//! ```text
//! Graph Nodes:
//! X1;X2;X3
//!
//! Graph Edges:
//! 1. X1 --> X2
//! 2. X2 o-o X3
//! ```
//!
//! Node names may be separated by `;` or `,`. Edge lines may carry a
//! leading `N.` and trailing property tokens, both ignored. Any later
//! section (a line ending in `:`) ends the edge list.

use super::{Edge, Endpoint, Graph};
use crate::error::{CausalError, Result};
use std::fmt::Write as _;
use std::path::Path;

const NODES_HEADER: &str = "Graph Nodes:";
const EDGES_HEADER: &str = "Graph Edges:";

/// Read a graph file
pub fn read_graph(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse_graph(&text, &path.display().to_string())
}

/// Write a graph file
pub fn write_graph(graph: &Graph, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, to_text(graph))?;
    Ok(())
}

/// Parse graph text; `source` labels errors
pub fn parse_graph(text: &str, source: &str) -> Result<Graph> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let nodes_at = lines
        .iter()
        .position(|l| *l == NODES_HEADER)
        .ok_or_else(|| CausalError::parse(source, "missing 'Graph Nodes:' section"))?;

    let mut graph = Graph::new();
    if let Some(line) = lines.get(nodes_at + 1) {
        if *line != EDGES_HEADER {
            for name in line.split([';', ',']).map(str::trim).filter(|s| !s.is_empty()) {
                graph
                    .add_node(name)
                    .map_err(|e| CausalError::parse(source, e.to_string()))?;
            }
        }
    }

    let Some(edges_at) = lines.iter().position(|l| *l == EDGES_HEADER) else {
        return Ok(graph);
    };

    for (offset, line) in lines[edges_at + 1..].iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        if line.ends_with(':') {
            break;
        }
        let line_no = edges_at + offset + 2;
        let edge = parse_edge(&graph, line)
            .map_err(|detail| CausalError::parse(source, format!("line {}: {}", line_no, detail)))?;
        graph
            .add_edge(edge)
            .map_err(|e| CausalError::parse(source, format!("line {}: {}", line_no, e)))?;
    }

    Ok(graph)
}

fn parse_edge(graph: &Graph, line: &str) -> std::result::Result<Edge, String> {
    let mut tokens = line.split_whitespace().peekable();
    if tokens.peek().is_some_and(|t| t.ends_with('.')) {
        tokens.next();
    }

    let (Some(a), Some(symbol), Some(b)) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(format!("malformed edge '{}'", line));
    };

    let (endpoint1, endpoint2) =
        parse_symbol(symbol).ok_or_else(|| format!("unknown edge symbol '{}'", symbol))?;
    let from = graph
        .node_index(a)
        .ok_or_else(|| format!("unknown node '{}'", a))?;
    let to = graph
        .node_index(b)
        .ok_or_else(|| format!("unknown node '{}'", b))?;

    Ok(Edge {
        from,
        to,
        endpoint1,
        endpoint2,
    })
}

fn parse_symbol(symbol: &str) -> Option<(Endpoint, Endpoint)> {
    let chars: Vec<char> = symbol.chars().collect();
    let [left, '-', right] = chars.as_slice() else {
        return None;
    };
    let left = match left {
        '-' => Endpoint::Tail,
        '<' => Endpoint::Arrow,
        'o' => Endpoint::Circle,
        _ => return None,
    };
    let right = match right {
        '-' => Endpoint::Tail,
        '>' => Endpoint::Arrow,
        'o' => Endpoint::Circle,
        _ => return None,
    };
    Some((left, right))
}

/// Render a graph in the text format
pub fn to_text(graph: &Graph) -> String {
    let mut out = String::new();
    out.push_str(NODES_HEADER);
    out.push('\n');
    let names: Vec<&str> = graph.nodes().iter().map(|n| n.name.as_str()).collect();
    out.push_str(&names.join(";"));
    out.push_str("\n\n");
    out.push_str(EDGES_HEADER);
    out.push('\n');
    for (i, edge) in graph.edges().iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} {} {}",
            i + 1,
            names[edge.from],
            edge.symbol(),
            names[edge.to]
        );
    }
    out
}
