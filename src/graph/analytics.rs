//! Ranking and summary statistics.
//!
//! Every metric returns one entry per live node keyed by node id, in a
//! `BTreeMap` so iteration order is stable. Degenerate graph sizes are
//! guarded and yield zeros (or an empty map for an empty graph) instead of
//! dividing by zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::RelationshipType;
use super::RelationshipGraph;
use super::traversal::tree_path;

/// PageRank parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Power-iteration rounds. There is no convergence early-exit.
    pub iterations: usize,
    /// Probability of following an edge rather than teleporting.
    pub damping: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self { iterations: 20, damping: 0.85 }
    }
}

/// Dashboard summary of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    /// Mean of in-degree + out-degree, i.e. `2|E| / |N|`.
    pub average_degree: f64,
    /// `|E| / (|N| (|N| - 1))`.
    pub density: f64,
    pub community_count: usize,
    pub mean_node_confidence: f64,
    pub mean_edge_confidence: f64,
    pub entity_types: BTreeMap<String, usize>,
    pub relationship_types: BTreeMap<RelationshipType, usize>,
}

impl RelationshipGraph {
    /// Power-iteration PageRank, starting from a uniform `1/N`.
    ///
    /// Each edge passes on `rank(src) · strength / out_degree(src)`.
    /// Strengths are not renormalised per node, so when a node's outgoing
    /// strengths sum to less than its out-degree some rank leaks away, and
    /// dangling nodes leak all of theirs. Totals therefore need not sum to 1.
    pub fn compute_pagerank(&self, config: &PageRankConfig) -> BTreeMap<String, f64> {
        let slots = self.live_slots();
        let n = slots.len();
        if n == 0 {
            return BTreeMap::new();
        }

        let dense = self.dense_positions(&slots);
        let out_degree: Vec<usize> = slots.iter().map(|&s| self.live_node(s).outgoing.len()).collect();
        let edges: Vec<(usize, usize, f64)> = self
            .edges
            .iter()
            .flatten()
            .map(|e| (dense[e.src], dense[e.dst], e.edge.strength))
            .collect();

        let base = (1.0 - config.damping) / n as f64;
        let mut rank = vec![1.0 / n as f64; n];
        for _ in 0..config.iterations {
            let mut next = vec![base; n];
            for &(src, dst, strength) in &edges {
                // out_degree[src] >= 1 because this edge leaves src.
                next[dst] += config.damping * rank[src] * strength / out_degree[src] as f64;
            }
            rank = next;
        }

        debug!(nodes = n, iterations = config.iterations, "pagerank finished");
        self.keyed(&slots, rank)
    }

    /// `(in + out) / (2 (N - 1))`; all zeros when `N <= 1`.
    pub fn compute_degree_centrality(&self) -> BTreeMap<String, f64> {
        let slots = self.live_slots();
        let n = slots.len();
        let scores = slots
            .iter()
            .map(|&s| {
                if n <= 1 {
                    return 0.0;
                }
                let slot = self.live_node(s);
                (slot.incoming.len() + slot.outgoing.len()) as f64 / (2.0 * (n - 1) as f64)
            })
            .collect();
        self.keyed(&slots, scores)
    }

    /// Betweenness over first-found shortest paths.
    ///
    /// For every ordered pair `(s, t)` the single path `shortest_path(s, t)`
    /// would return is taken, and each strictly interior node is credited
    /// once. Totals are scaled by `2 / ((N - 1)(N - 2))`; all zeros when
    /// `N <= 2`. One BFS per source, so `O(N · (N + E) + N² · path_len)`:
    /// fine for investigation-sized graphs, not for large ones.
    pub fn compute_betweenness_centrality(&self) -> BTreeMap<String, f64> {
        let slots = self.live_slots();
        let n = slots.len();
        if n <= 2 {
            return self.keyed(&slots, vec![0.0; n]);
        }

        let dense = self.dense_positions(&slots);
        let mut credit = vec![0.0; n];
        for &src in &slots {
            let parent = self.bfs_tree(src);
            for &dst in &slots {
                if dst == src {
                    continue;
                }
                let Some(path) = tree_path(&parent, src, dst) else { continue };
                if path.len() > 2 {
                    for &interior in &path[1..path.len() - 1] {
                        credit[dense[interior]] += 1.0;
                    }
                }
            }
        }

        let scale = 2.0 / ((n - 1) as f64 * (n - 2) as f64);
        let scores = credit.into_iter().map(|c| c * scale).collect();
        debug!(nodes = n, "betweenness centrality finished");
        self.keyed(&slots, scores)
    }

    pub fn get_statistics(&self) -> GraphStatistics {
        let n = self.node_count();
        let e = self.edge_count();

        let mut entity_types = BTreeMap::new();
        for node in self.nodes() {
            *entity_types.entry(node.entity_type.clone()).or_insert(0) += 1;
        }
        let mut relationship_types = BTreeMap::new();
        for edge in self.edges() {
            *relationship_types.entry(edge.relationship_type).or_insert(0) += 1;
        }

        GraphStatistics {
            node_count: n,
            edge_count: e,
            average_degree: if n == 0 { 0.0 } else { 2.0 * e as f64 / n as f64 },
            density: if n <= 1 { 0.0 } else { e as f64 / (n as f64 * (n - 1) as f64) },
            community_count: self.community_detection().len(),
            mean_node_confidence: mean(self.nodes().map(|n| n.confidence)),
            mean_edge_confidence: mean(self.edges().map(|e| e.confidence)),
            entity_types,
            relationship_types,
        }
    }

    /// Arena slot → dense position among `slots`.
    fn dense_positions(&self, slots: &[usize]) -> Vec<usize> {
        let mut dense = vec![usize::MAX; self.nodes.len()];
        for (i, &s) in slots.iter().enumerate() {
            dense[s] = i;
        }
        dense
    }

    fn keyed(&self, slots: &[usize], scores: Vec<f64>) -> BTreeMap<String, f64> {
        slots
            .iter()
            .zip(scores)
            .map(|(&s, score)| (self.live_node(s).node.id.clone(), score))
            .collect()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// The `n` best-scoring ids, highest first; ties broken by id.
pub fn top_ranked(scores: &BTreeMap<String, f64>, n: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = scores.iter().map(|(k, v)| (k.clone(), *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}
