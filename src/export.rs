//! Graph export — structural snapshot and GraphML markup.
//!
//! Two ways out of the engine:
//!
//! ```text
//! RelationshipGraph → snapshot()      → GraphSnapshot → JSON for the report/API layer
//!                   → write_graphml() → GraphML       → Gephi, yEd, Cytoscape, networkx
//! ```
//!
//! A snapshot can be loaded back with [`RelationshipGraph::from_snapshot`],
//! which keeps node ids, edge ids and timestamps.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::graph::{GraphStatistics, RelationshipGraph};
use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// Snapshot
// ============================================================================

/// Full structural copy of a graph: `{nodes, edges, stats}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<EntityNode>,
    pub edges: Vec<EntityEdge>,
    pub stats: GraphStatistics,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl RelationshipGraph {
    /// Detached copy of every node and edge (insertion order) plus stats.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
            stats: self.get_statistics(),
        }
    }

    /// Rebuild a graph from a snapshot. The `stats` block is ignored.
    ///
    /// Fails on duplicate node or edge ids and on edges whose endpoints are
    /// not among the snapshot's nodes.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut graph = RelationshipGraph::new();
        for node in snapshot.nodes {
            graph.restore_node(node)?;
        }
        for edge in snapshot.edges {
            let id = edge.id;
            graph.restore_edge(edge).map_err(|err| match err {
                Error::UnknownNode { id: node } => {
                    Error::InvalidSnapshot(format!("edge {id} references missing node {node}"))
                }
                other => other,
            })?;
        }
        Ok(graph)
    }
}

// ============================================================================
// GraphML
// ============================================================================

/// `(id, for, name, type)` of every declared GraphML key.
const GRAPHML_KEYS: &[(&str, &str, &str, &str)] = &[
    ("n_type", "node", "entity_type", "string"),
    ("n_conf", "node", "confidence", "double"),
    ("n_sources", "node", "sources", "string"),
    ("n_tags", "node", "tags", "string"),
    ("n_attrs", "node", "attributes", "string"),
    ("e_rel", "edge", "relationship_type", "string"),
    ("e_kind", "edge", "edge_type", "string"),
    ("e_strength", "edge", "strength", "double"),
    ("e_conf", "edge", "confidence", "double"),
    ("e_connector", "edge", "source_connector", "string"),
    ("e_meta", "edge", "metadata", "string"),
];

/// Write the graph as a directed GraphML document.
///
/// Sources and tags are `;`-joined; attribute and metadata maps are
/// embedded as JSON strings since GraphML has no nested types.
pub fn write_graphml(graph: &RelationshipGraph, writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(writer, r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">"#)?;
    for (id, target, name, ty) in GRAPHML_KEYS {
        writeln!(
            writer,
            r#"  <key id="{id}" for="{target}" attr.name="{name}" attr.type="{ty}"/>"#
        )?;
    }
    writeln!(writer, r#"  <graph id="identity-graph" edgedefault="directed">"#)?;

    for node in graph.nodes() {
        writeln!(writer, r#"    <node id="{}">"#, escape_xml(&node.id))?;
        data(writer, "n_type", &node.entity_type)?;
        data(writer, "n_conf", &node.confidence.to_string())?;
        data(writer, "n_sources", &join(&node.sources))?;
        data(writer, "n_tags", &join(&node.tags))?;
        data(writer, "n_attrs", &serde_json::to_string(&node.attributes)?)?;
        writeln!(writer, "    </node>")?;
    }

    for edge in graph.edges() {
        writeln!(
            writer,
            r#"    <edge id="e{}" source="{}" target="{}">"#,
            edge.id,
            escape_xml(&edge.source_id),
            escape_xml(&edge.target_id),
        )?;
        data(writer, "e_rel", edge.relationship_type.as_str())?;
        data(writer, "e_kind", edge.edge_type.as_str())?;
        data(writer, "e_strength", &edge.strength.to_string())?;
        data(writer, "e_conf", &edge.confidence.to_string())?;
        data(writer, "e_connector", &edge.source_connector)?;
        data(writer, "e_meta", &serde_json::to_string(&edge.metadata)?)?;
        writeln!(writer, "    </edge>")?;
    }

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</graphml>")?;
    Ok(())
}

/// [`write_graphml`] into a `String`.
pub fn to_graphml_string(graph: &RelationshipGraph) -> Result<String> {
    let mut buf = Vec::new();
    write_graphml(graph, &mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn data(writer: &mut dyn Write, key: &str, value: &str) -> Result<()> {
    writeln!(writer, r#"      <data key="{key}">{}</data>"#, escape_xml(value))?;
    Ok(())
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items.into_iter().map(String::as_str).collect::<Vec<_>>().join(";")
}

/// Escape the five XML special characters and drop code points XML 1.0
/// cannot carry (C0 controls other than tab, LF, CR; U+FFFE and U+FFFF).
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
