//! Path finding, sub-graph extraction, connectivity and transitive inference.
//!
//! All queries here are read-only and iterative (explicit queues and
//! stacks), so deep or cyclic graphs cannot blow the call stack.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::model::*;
use super::RelationshipGraph;

/// Connector name stamped on synthesized transitive candidates.
pub const TRANSITIVE_CONNECTOR: &str = "transitive_inference";

impl RelationshipGraph {
    /// Fewest-hop path `from → to` along outgoing edges.
    ///
    /// Breadth-first; among equally short paths the one discovered first in
    /// adjacency insertion order wins. Edge weights play no part.
    /// `shortest_path(x, x)` is `[x]` for any existing `x`.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let src = self.slot_of(from)?;
        let dst = self.slot_of(to)?;
        let slots = self.bfs_path(src, dst)?;
        Some(slots.into_iter().map(|s| self.live_node(s).node.id.clone()).collect())
    }

    /// BFS over node slots. Returns the slot path including both ends.
    pub(super) fn bfs_path(&self, src: usize, dst: usize) -> Option<Vec<usize>> {
        if src == dst {
            return Some(vec![src]);
        }
        let mut parent: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([src]);
        seen[src] = true;

        while let Some(current) = queue.pop_front() {
            for (_, next) in self.out_targets(current) {
                if seen[next] {
                    continue;
                }
                seen[next] = true;
                parent[next] = Some(current);
                if next == dst {
                    return Some(unwind(&parent, src, dst));
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// BFS tree from `src`: `parent[v]` is the predecessor of `v` on the
    /// first-discovered shortest path. Paths read off this tree are the
    /// same paths [`bfs_path`](Self::bfs_path) returns for each target.
    pub(super) fn bfs_tree(&self, src: usize) -> Vec<Option<usize>> {
        let mut parent: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([src]);
        seen[src] = true;

        while let Some(current) = queue.pop_front() {
            for (_, next) in self.out_targets(current) {
                if !seen[next] {
                    seen[next] = true;
                    parent[next] = Some(current);
                    queue.push_back(next);
                }
            }
        }
        parent
    }

    /// Product over consecutive steps of the best edge confidence for that
    /// step. A step with no `a → b` edge makes the whole path 0.
    ///
    /// A single-node path is trivially certain (1.0); an empty one is 0.
    pub fn path_confidence<S: AsRef<str>>(&self, path: &[S]) -> f64 {
        if path.is_empty() {
            return 0.0;
        }
        path.windows(2)
            .map(|step| {
                self.edges_between(step[0].as_ref(), step[1].as_ref())
                    .iter()
                    .map(|e| e.confidence)
                    .fold(0.0, f64::max)
            })
            .product()
    }

    /// Copy of everything reachable from `center` within `depth` hops along
    /// outgoing edges, optionally restricted to one relationship type.
    ///
    /// Each reached node is expanded once, but every traversed edge is kept,
    /// including edges back into already-visited nodes. Node and edge ids are
    /// preserved in the copy. `None` if `center` does not exist.
    pub fn ego_network(
        &self,
        center: &str,
        depth: usize,
        relationship: Option<RelationshipType>,
    ) -> Option<RelationshipGraph> {
        let start = self.slot_of(center)?;
        let mut ego = RelationshipGraph::new();
        let mut expanded = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([(start, 0usize)]);
        expanded[start] = true;
        ego.push_node(self.live_node(start).node.clone());

        while let Some((current, hops)) = queue.pop_front() {
            if hops >= depth {
                continue;
            }
            for (edge_slot, next) in self.out_targets(current) {
                let edge = &self.live_edge(edge_slot).edge;
                if relationship.is_some_and(|r| r != edge.relationship_type) {
                    continue;
                }
                let target = &self.live_node(next).node;
                if !ego.contains_node(&target.id) {
                    ego.push_node(target.clone());
                }
                // Each source node is expanded once, so each edge arrives once.
                if let Err(err) = ego.restore_edge(edge.clone()) {
                    debug!(%err, "skipping edge while building ego network");
                }
                if !expanded[next] {
                    expanded[next] = true;
                    queue.push_back((next, hops + 1));
                }
            }
        }

        debug!(
            center,
            depth,
            nodes = ego.node_count(),
            edges = ego.edge_count(),
            "built ego network"
        );
        Some(ego)
    }

    /// Connected components of the undirected view of the graph.
    ///
    /// Components are ordered by their earliest-inserted node.
    pub fn community_detection(&self) -> Vec<BTreeSet<String>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut communities = Vec::new();

        for start in self.live_slots() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut stack = vec![start];
            let mut members = BTreeSet::new();

            while let Some(current) = stack.pop() {
                let slot = self.live_node(current);
                members.insert(slot.node.id.clone());
                let out = slot.outgoing.iter().map(|&e| self.live_edge(e).dst);
                let inc = slot.incoming.iter().map(|&e| self.live_edge(e).src);
                for next in out.chain(inc) {
                    if !seen[next] {
                        seen[next] = true;
                        stack.push(next);
                    }
                }
            }
            communities.push(members);
        }

        debug!(communities = communities.len(), "community detection finished");
        communities
    }

    /// Candidate `A → C` edges implied by `A → B → C` chains of one type.
    ///
    /// Strength and confidence are the products of the two hops. The graph
    /// is not modified; feed the candidates to `add_edge` to keep them.
    /// Chains through a self-loop and chains that lead back to their own
    /// start (`A → B → A`) yield nothing.
    pub fn compute_transitive_relationships(&self, relationship: RelationshipType) -> Vec<NewEdge> {
        let mut candidates = Vec::new();

        for via in self.live_slots() {
            let via_slot = self.live_node(via);
            for &in_slot in &via_slot.incoming {
                let first = self.live_edge(in_slot);
                if first.edge.relationship_type != relationship || first.src == via {
                    continue;
                }
                for &out_slot in &via_slot.outgoing {
                    let second = self.live_edge(out_slot);
                    if second.edge.relationship_type != relationship
                        || second.dst == via
                        || second.dst == first.src
                    {
                        continue;
                    }
                    candidates.push(
                        NewEdge::new(
                            first.edge.source_id.clone(),
                            second.edge.target_id.clone(),
                            relationship,
                        )
                        .edge_type(EdgeType::Transitive)
                        .strength(first.edge.strength * second.edge.strength)
                        .confidence(first.edge.confidence * second.edge.confidence)
                        .connector(TRANSITIVE_CONNECTOR)
                        .metadata("via", via_slot.node.id.as_str())
                        .metadata(
                            "derived_from",
                            vec![first.edge.id.0 as i64, second.edge.id.0 as i64],
                        ),
                    );
                }
            }
        }

        debug!(%relationship, candidates = candidates.len(), "computed transitive candidates");
        candidates
    }
}

fn unwind(parent: &[Option<usize>], src: usize, dst: usize) -> Vec<usize> {
    let mut path = vec![dst];
    let mut current = dst;
    while current != src {
        match parent[current] {
            Some(p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Slot path `src → dst` read off a BFS tree, if `dst` was reached.
pub(super) fn tree_path(parent: &[Option<usize>], src: usize, dst: usize) -> Option<Vec<usize>> {
    if src != dst && parent[dst].is_none() {
        return None;
    }
    Some(unwind(parent, src, dst))
}
