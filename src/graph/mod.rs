//! # Relationship Graph
//!
//! In-memory directed multigraph of resolved entities.
//!
//! ## Storage
//!
//! Nodes and edges live in two arenas addressed by dense slot indices,
//! with `id → slot` lookup maps on the side. Each node slot carries its
//! outgoing and incoming edge slots in insertion order; that order is the
//! tie-break for every traversal. Removed entries leave a tombstone so
//! slots stay stable; nothing is ever renumbered.
//!
//! ## Limitations
//!
//! - **Not thread-safe**: mutation takes `&mut self`. Wrap in
//!   [`SharedGraph`] or snapshot it when several threads need access.
//! - **No cancellation**: analytics run to completion. Bound the graph
//!   size before calling betweenness or PageRank on untrusted input.
//! - **Tombstones**: removals leave empty slots until they outnumber the
//!   live ones, then a removal compacts the arena in place. Insertion
//!   order survives compaction; slot numbers do not.

pub mod traversal;
pub mod analytics;
pub mod shared;

use chrono::Utc;
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::model::*;
use crate::{Error, Result};

pub use analytics::{GraphStatistics, PageRankConfig, top_ranked};
pub use shared::SharedGraph;

type EdgeSlots = SmallVec<[usize; 4]>;

/// Dead slots tolerated before a removal considers compacting.
const COMPACT_MIN_TOMBSTONES: usize = 64;

#[derive(Debug, Clone)]
struct NodeSlot {
    node: EntityNode,
    outgoing: EdgeSlots,
    incoming: EdgeSlots,
}

#[derive(Debug, Clone)]
struct EdgeSlot {
    edge: EntityEdge,
    src: usize,
    dst: usize,
}

// ============================================================================
// RelationshipGraph
// ============================================================================

/// Owner of every entity node and relationship edge.
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    nodes: Vec<Option<NodeSlot>>,
    edges: Vec<Option<EdgeSlot>>,
    node_index: HashMap<String, usize>,
    edge_index: HashMap<EdgeId, usize>,
    next_edge_id: u64,
}

impl Default for RelationshipGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            next_edge_id: 1,
        }
    }

    // ========================================================================
    // Node CRUD
    // ========================================================================

    /// Insert a node, or merge into the node with the same id.
    ///
    /// Merging overwrites attribute keys present in the update, keeps the
    /// rest, raises confidence to the max of both and unions sources.
    pub fn upsert_node(&mut self, new: NewNode) -> &EntityNode {
        let slot = match self.node_index.get(&new.id) {
            Some(&slot) => {
                let existing = self.nodes[slot].as_mut().map(|s| &mut s.node);
                if let Some(node) = existing {
                    debug!(node_id = %new.id, "merging node");
                    node.merge(new);
                }
                slot
            }
            None => {
                debug!(node_id = %new.id, entity_type = %new.entity_type, "creating node");
                self.push_node(new.into_node(Utc::now()))
            }
        };
        &self.live_node(slot).node
    }

    pub fn get_node(&self, id: &str) -> Option<&EntityNode> {
        self.slot_of(id).map(|slot| &self.live_node(slot).node)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Attach a free-form tag. Returns false if the node is unknown.
    pub fn tag_node(&mut self, id: &str, tag: impl Into<String>) -> bool {
        let Some(slot) = self.slot_of(id) else { return false };
        match self.nodes[slot].as_mut() {
            Some(s) => {
                s.node.tags.insert(tag.into());
                true
            }
            None => false,
        }
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(slot) = self.node_index.remove(id) else { return false };
        let Some(removed) = self.nodes[slot].take() else { return false };

        let mut touching: Vec<usize> = removed.outgoing.iter().chain(removed.incoming.iter()).copied().collect();
        touching.sort_unstable();
        touching.dedup();
        for edge_slot in &touching {
            self.unlink_edge(*edge_slot);
        }

        debug!(node_id = %id, edges_removed = touching.len(), "removed node");
        self.compact_if_sparse();
        true
    }

    // ========================================================================
    // Edge CRUD
    // ========================================================================

    /// Add a directed edge between two existing nodes.
    ///
    /// Parallel edges and self-loops are accepted. A missing endpoint is
    /// reported as [`Error::UnknownNode`]; no placeholder node is created.
    pub fn add_edge(&mut self, new: NewEdge) -> Result<&EntityEdge> {
        let Some(src) = self.slot_of(&new.source_id) else {
            warn!(node_id = %new.source_id, rel = %new.relationship_type, "edge rejected: unknown source node");
            return Err(Error::UnknownNode { id: new.source_id });
        };
        let Some(dst) = self.slot_of(&new.target_id) else {
            warn!(node_id = %new.target_id, rel = %new.relationship_type, "edge rejected: unknown target node");
            return Err(Error::UnknownNode { id: new.target_id });
        };

        let id = EdgeId(self.next_edge_id);
        let edge = new.into_edge(id, Utc::now());
        let slot = self.link_edge(edge, src, dst);
        Ok(&self.live_edge(slot).edge)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&EntityEdge> {
        let slot = *self.edge_index.get(&id)?;
        self.edges[slot].as_ref().map(|s| &s.edge)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        match self.edge_index.get(&id) {
            Some(&slot) => {
                self.unlink_edge(slot);
                debug!(edge_id = %id, "removed edge");
                self.compact_if_sparse();
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Read-only views
    // ========================================================================

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_index.is_empty()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &EntityNode> + '_ {
        self.nodes.iter().flatten().map(|s| &s.node)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &EntityEdge> + '_ {
        self.edges.iter().flatten().map(|s| &s.edge)
    }

    pub fn nodes_by_type(&self, entity_type: &str) -> Vec<&EntityNode> {
        self.nodes().filter(|n| n.entity_type == entity_type).collect()
    }

    /// Outgoing neighbour ids, one entry per edge, in insertion order.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        self.edges_from(id).into_iter().map(|e| e.target_id.as_str()).collect()
    }

    pub fn edges_from(&self, id: &str) -> Vec<&EntityEdge> {
        self.slot_of(id)
            .map(|slot| self.edge_list(&self.live_node(slot).outgoing))
            .unwrap_or_default()
    }

    pub fn edges_to(&self, id: &str) -> Vec<&EntityEdge> {
        self.slot_of(id)
            .map(|slot| self.edge_list(&self.live_node(slot).incoming))
            .unwrap_or_default()
    }

    /// Edges directed `source → target`.
    pub fn edges_between(&self, source: &str, target: &str) -> Vec<&EntityEdge> {
        self.edges_from(source)
            .into_iter()
            .filter(|e| e.target_id == target)
            .collect()
    }

    // ========================================================================
    // Internals shared with traversal / analytics / export
    // ========================================================================

    fn slot_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Caller guarantees `slot` came from `node_index` or an edge endpoint.
    fn live_node(&self, slot: usize) -> &NodeSlot {
        match &self.nodes[slot] {
            Some(s) => s,
            None => unreachable!("node index points at a tombstone"),
        }
    }

    fn live_edge(&self, slot: usize) -> &EdgeSlot {
        match &self.edges[slot] {
            Some(s) => s,
            None => unreachable!("adjacency points at a removed edge"),
        }
    }

    fn edge_list(&self, slots: &EdgeSlots) -> Vec<&EntityEdge> {
        slots.iter().map(|&e| &self.live_edge(e).edge).collect()
    }

    /// Live node slots in insertion order.
    fn live_slots(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect()
    }

    /// `(edge slot, target slot)` for every outgoing edge of `slot`.
    fn out_targets(&self, slot: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.live_node(slot)
            .outgoing
            .iter()
            .map(move |&e| (e, self.live_edge(e).dst))
    }

    fn push_node(&mut self, node: EntityNode) -> usize {
        let slot = self.nodes.len();
        self.node_index.insert(node.id.clone(), slot);
        self.nodes.push(Some(NodeSlot {
            node,
            outgoing: EdgeSlots::new(),
            incoming: EdgeSlots::new(),
        }));
        slot
    }

    fn link_edge(&mut self, edge: EntityEdge, src: usize, dst: usize) -> usize {
        let slot = self.edges.len();
        let id = edge.id;
        self.next_edge_id = self.next_edge_id.max(id.0 + 1);
        debug!(edge_id = %id, rel = %edge.relationship_type, "adding edge");

        self.edge_index.insert(id, slot);
        self.edges.push(Some(EdgeSlot { edge, src, dst }));
        if let Some(s) = self.nodes[src].as_mut() {
            s.outgoing.push(slot);
        }
        if let Some(s) = self.nodes[dst].as_mut() {
            s.incoming.push(slot);
        }
        slot
    }

    fn unlink_edge(&mut self, slot: usize) {
        let Some(removed) = self.edges[slot].take() else { return };
        self.edge_index.remove(&removed.edge.id);
        if let Some(s) = self.nodes[removed.src].as_mut() {
            s.outgoing.retain(|e| *e != slot);
        }
        if let Some(s) = self.nodes[removed.dst].as_mut() {
            s.incoming.retain(|e| *e != slot);
        }
    }

    fn compact_if_sparse(&mut self) {
        let live = self.node_index.len() + self.edge_index.len();
        let dead = self.nodes.len() + self.edges.len() - live;
        if dead >= COMPACT_MIN_TOMBSTONES && dead > live {
            self.compact();
        }
    }

    /// Drop tombstones and renumber slots, keeping relative order.
    fn compact(&mut self) {
        let mut node_map = vec![usize::MAX; self.nodes.len()];
        let mut nodes = Vec::with_capacity(self.node_index.len());
        for (old, slot) in std::mem::take(&mut self.nodes).into_iter().enumerate() {
            if let Some(slot) = slot {
                node_map[old] = nodes.len();
                nodes.push(Some(slot));
            }
        }

        let mut edge_map = vec![usize::MAX; self.edges.len()];
        let mut edges = Vec::with_capacity(self.edge_index.len());
        for (old, slot) in std::mem::take(&mut self.edges).into_iter().enumerate() {
            if let Some(mut slot) = slot {
                // Live edges only ever point at live nodes.
                slot.src = node_map[slot.src];
                slot.dst = node_map[slot.dst];
                edge_map[old] = edges.len();
                edges.push(Some(slot));
            }
        }

        for slot in nodes.iter_mut().flatten() {
            for e in slot.outgoing.iter_mut().chain(slot.incoming.iter_mut()) {
                *e = edge_map[*e];
            }
        }

        self.node_index = nodes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (s.node.id.clone(), i)))
            .collect();
        self.edge_index = edges
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (s.edge.id, i)))
            .collect();
        debug!(nodes = nodes.len(), edges = edges.len(), "compacted graph arena");
        self.nodes = nodes;
        self.edges = edges;
    }

    /// Copy a node verbatim (id, timestamps, tags) into this graph.
    pub(crate) fn restore_node(&mut self, node: EntityNode) -> Result<usize> {
        if self.contains_node(&node.id) {
            return Err(Error::InvalidSnapshot(format!("duplicate node id {}", node.id)));
        }
        Ok(self.push_node(node))
    }

    /// Copy an edge verbatim, keeping its id.
    pub(crate) fn restore_edge(&mut self, edge: EntityEdge) -> Result<usize> {
        if self.edge_index.contains_key(&edge.id) {
            return Err(Error::InvalidSnapshot(format!("duplicate edge id {}", edge.id)));
        }
        let src = self.slot_of(&edge.source_id).ok_or_else(|| Error::UnknownNode { id: edge.source_id.clone() })?;
        let dst = self.slot_of(&edge.target_id).ok_or_else(|| Error::UnknownNode { id: edge.target_id.clone() })?;
        Ok(self.link_edge(edge, src, dst))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str) -> NewNode {
        NewNode::new(id, "PERSON").source("test")
    }

    fn knows(a: &str, b: &str) -> NewEdge {
        NewEdge::new(a, b, RelationshipType::Knows)
    }

    #[test]
    fn test_upsert_creates_then_merges() {
        let mut g = RelationshipGraph::new();
        g.upsert_node(person("a").attribute("name", "Ada").confidence(0.6));
        let merged = g.upsert_node(
            NewNode::new("a", "PERSON").attribute("email", "ada@x.io").confidence(0.4).source("whois"),
        );
        assert_eq!(merged.confidence, 0.6);
        assert_eq!(merged.get("name"), Some(&Value::from("Ada")));
        assert_eq!(merged.get("email"), Some(&Value::from("ada@x.io")));
        assert_eq!(merged.sources.len(), 2);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_add_edge_unknown_node() {
        let mut g = RelationshipGraph::new();
        g.upsert_node(person("a"));
        let err = g.add_edge(knows("a", "ghost")).unwrap_err();
        assert!(matches!(err, Error::UnknownNode { ref id } if id == "ghost"));
        assert!(!g.contains_node("ghost"));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_multigraph_and_self_loops() {
        let mut g = RelationshipGraph::new();
        g.upsert_node(person("a"));
        g.upsert_node(person("b"));
        let e1 = g.add_edge(knows("a", "b")).unwrap().id;
        let e2 = g.add_edge(knows("a", "b")).unwrap().id;
        g.add_edge(knows("a", "a")).unwrap();
        assert_ne!(e1, e2);
        assert_eq!(g.edges_between("a", "b").len(), 2);
        assert_eq!(g.edges_from("a").len(), 3);
        assert_eq!(g.edges_to("a").len(), 1);
        assert_eq!(g.neighbors("a"), vec!["b", "b", "a"]);
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut g = RelationshipGraph::new();
        for id in ["a", "b", "c"] {
            g.upsert_node(person(id));
        }
        g.add_edge(knows("a", "b")).unwrap();
        g.add_edge(knows("b", "c")).unwrap();
        g.add_edge(knows("b", "b")).unwrap();
        g.add_edge(knows("a", "c")).unwrap();

        assert!(g.remove_node("b"));
        assert!(!g.remove_node("b"));
        assert_eq!(g.edge_count(), 1);
        assert!(g.edges_from("b").is_empty());
        assert!(g.edges_to("b").is_empty());
        assert_eq!(g.neighbors("a"), vec!["c"]);
        assert!(g.edges_to("c").iter().all(|e| e.source_id == "a"));
    }

    #[test]
    fn test_remove_edge() {
        let mut g = RelationshipGraph::new();
        g.upsert_node(person("a"));
        g.upsert_node(person("b"));
        let id = g.add_edge(knows("a", "b")).unwrap().id;
        assert!(g.remove_edge(id));
        assert!(!g.remove_edge(id));
        assert!(g.get_edge(id).is_none());
        assert!(g.neighbors("a").is_empty());
        assert!(g.edges_to("b").is_empty());
    }

    #[test]
    fn test_readd_after_remove_gets_new_slot() {
        let mut g = RelationshipGraph::new();
        g.upsert_node(person("a"));
        g.remove_node("a");
        g.upsert_node(person("a").attribute("k", 1));
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.get_node("a").unwrap().get("k"), Some(&Value::Int(1)));
        assert!(g.get_node("a").unwrap().get("name").is_none());
    }

    #[test]
    fn test_churn_compacts_tombstones() {
        let mut g = RelationshipGraph::new();
        g.upsert_node(person("hub"));
        for i in 0..500 {
            let id = format!("tmp{i}");
            g.upsert_node(person(&id));
            g.add_edge(knows("hub", &id)).unwrap();
            if i == 250 {
                g.upsert_node(person("keeper"));
                g.add_edge(knows("hub", "keeper")).unwrap();
                g.add_edge(knows("keeper", "hub")).unwrap();
            }
            assert!(g.remove_node(&id));
        }

        assert!(g.nodes.len() + g.edges.len() <= COMPACT_MIN_TOMBSTONES + 5);
        assert_eq!(g.nodes().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["hub", "keeper"]);
        assert_eq!(g.neighbors("hub"), vec!["keeper"]);
        assert_eq!(g.neighbors("keeper"), vec!["hub"]);
        assert_eq!(g.edges_to("hub").len(), 1);
        for edge in g.edges() {
            assert_eq!(g.get_edge(edge.id), Some(edge));
        }

        let fresh = g.add_edge(knows("keeper", "keeper")).unwrap().id;
        assert_eq!(fresh, EdgeId(503));
    }

    #[test]
    fn test_tags_and_types() {
        let mut g = RelationshipGraph::new();
        g.upsert_node(person("a"));
        g.upsert_node(NewNode::new("example.org", "DOMAIN"));
        assert!(g.tag_node("a", "watchlist"));
        assert!(!g.tag_node("zzz", "watchlist"));
        assert!(g.get_node("a").unwrap().has_tag("watchlist"));
        assert_eq!(g.nodes_by_type("DOMAIN").len(), 1);
    }
}
