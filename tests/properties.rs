//! Property tests: score bounds, symmetry, determinism and graph
//! invariants over generated inputs.

use identity_graph::matcher::fields::normalize_phone;
use identity_graph::matcher::strings::{jaro_winkler, levenshtein_ratio, metaphone, soundex};
use identity_graph::{
    Algorithm, IdentityRecord, Matcher, NewEdge, NewNode, PageRankConfig, RelationshipGraph,
    RelationshipType,
};
use proptest::prelude::*;

fn record_strategy() -> impl Strategy<Value = IdentityRecord> {
    (
        proptest::option::of("[a-c]{1,3} [a-c]{1,3}"),
        proptest::option::of("[a-c]{1,2}@(x|y)\\.io"),
        proptest::option::of("[0-9]{10}"),
        proptest::option::of("[a-c_]{1,4}"),
    )
        .prop_map(|(name, email, phone, username)| IdentityRecord {
            name,
            email,
            phone,
            username,
            ..IdentityRecord::default()
        })
}

/// Node count plus edge endpoints as indices into that count.
fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize, f64)>)> {
    (1usize..12).prop_flat_map(|n| {
        let edge = (0..n, 0..n, 0.0f64..=1.0);
        (Just(n), proptest::collection::vec(edge, 0..30))
    })
}

fn build(n: usize, edges: &[(usize, usize, f64)]) -> RelationshipGraph {
    let mut g = RelationshipGraph::new();
    for i in 0..n {
        g.upsert_node(NewNode::new(format!("n{i}"), "PERSON"));
    }
    for &(a, b, strength) in edges {
        g.add_edge(
            NewEdge::new(format!("n{a}"), format!("n{b}"), RelationshipType::Associated)
                .strength(strength)
                .confidence(strength),
        )
        .unwrap();
    }
    g
}

proptest! {
    // ========================================================================
    // String primitives
    // ========================================================================

    #[test]
    fn prop_similarities_in_unit_range(a in "\\PC{0,12}", b in "\\PC{0,12}") {
        let jw = jaro_winkler(&a, &b);
        let lev = levenshtein_ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&jw));
        prop_assert!((0.0..=1.0).contains(&lev));
        prop_assert_eq!(lev, levenshtein_ratio(&b, &a));
        prop_assert_eq!(jw, jaro_winkler(&b, &a));
    }

    #[test]
    fn prop_jaro_winkler_symmetric_on_repetitive_strings(a in "[abcde]{0,10}", b in "[abcde]{0,10}") {
        prop_assert_eq!(jaro_winkler(&a, &b), jaro_winkler(&b, &a));
    }

    #[test]
    fn prop_identical_strings_score_one(s in "[a-zA-Z ]{1,16}") {
        prop_assert_eq!(jaro_winkler(&s, &s), 1.0);
        prop_assert_eq!(levenshtein_ratio(&s, &s), 1.0);
    }

    #[test]
    fn prop_phonetic_keys_have_fixed_shape(s in "[a-zA-Z0-9 '-]{0,16}") {
        let has_letter = s.chars().any(|c| c.is_ascii_alphabetic());
        for key in [soundex(&s), metaphone(&s)] {
            if has_letter {
                prop_assert_eq!(key.len(), 4);
            } else {
                prop_assert!(key.is_empty());
            }
        }
    }

    #[test]
    fn prop_phone_normalization_is_idempotent(digits in "[0-9]{10,15}") {
        let once = normalize_phone(&digits);
        prop_assert!(once.is_some());
        prop_assert_eq!(once.as_deref().and_then(normalize_phone), once.clone());
    }

    // ========================================================================
    // Matcher
    // ========================================================================

    #[test]
    fn prop_compare_strings_bounds(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
        let m = Matcher::default();
        for algorithm in [Algorithm::Exact, Algorithm::Levenshtein, Algorithm::JaroWinkler, Algorithm::Soundex] {
            let s = m.compare_strings(&a, &b, algorithm);
            prop_assert!((0.0..=1.0).contains(&s.score));
            prop_assert!((0.0..=100.0).contains(&s.confidence));
        }
    }

    #[test]
    fn prop_multi_signal_bounds(a in record_strategy(), b in record_strategy()) {
        let s = Matcher::default().multi_signal_match(&a, &b);
        prop_assert!((0.0..=100.0).contains(&s.confidence));
    }

    #[test]
    fn prop_clusters_partition_input(records in proptest::collection::vec(record_strategy(), 0..12)) {
        let m = Matcher::default();
        let clusters = m.cluster(&records);
        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.indices()).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..records.len()).collect::<Vec<_>>());

        for cluster in &clusters {
            prop_assert_eq!(cluster.members[0].index, cluster.seed);
            for member in &cluster.members[1..] {
                prop_assert!(member.index > cluster.seed);
                prop_assert!(member.confidence >= m.config().cluster_threshold);
            }
        }
        prop_assert_eq!(clusters, m.cluster(&records));
    }

    // ========================================================================
    // Graph
    // ========================================================================

    #[test]
    fn prop_adjacency_matches_edge_list((n, edges) in graph_strategy(), victim in 0usize..12) {
        let mut g = build(n, &edges);
        g.remove_node(&format!("n{victim}"));

        let out_total: usize = g.nodes().map(|node| g.edges_from(&node.id).len()).sum();
        let in_total: usize = g.nodes().map(|node| g.edges_to(&node.id).len()).sum();
        prop_assert_eq!(out_total, g.edge_count());
        prop_assert_eq!(in_total, g.edge_count());
        for edge in g.edges() {
            prop_assert!(g.contains_node(&edge.source_id));
            prop_assert!(g.contains_node(&edge.target_id));
        }
    }

    #[test]
    fn prop_pagerank_is_bounded_and_deterministic((n, edges) in graph_strategy()) {
        let g = build(n, &edges);
        let config = PageRankConfig::default();
        let ranks = g.compute_pagerank(&config);
        let total: f64 = ranks.values().sum();
        prop_assert_eq!(ranks.len(), n);
        prop_assert!(total <= 1.0 + 1e-9, "total {}", total);
        prop_assert!(ranks.values().all(|r| *r >= (1.0 - config.damping) / n as f64 - 1e-12));
        prop_assert_eq!(ranks, g.compute_pagerank(&config));
    }

    #[test]
    fn prop_centralities_are_bounded((n, edges) in graph_strategy()) {
        let g = build(n, &edges);
        // Directed pairs under the undirected scale: a node interior to every
        // ordered pair scores 2.
        for score in g.compute_betweenness_centrality().values() {
            prop_assert!((0.0..=2.0 + 1e-9).contains(score));
        }
        for score in g.compute_degree_centrality().values() {
            prop_assert!(*score >= 0.0);
        }
    }

    #[test]
    fn prop_communities_cover_every_node((n, edges) in graph_strategy()) {
        let g = build(n, &edges);
        let communities = g.community_detection();
        let covered: usize = communities.iter().map(|c| c.len()).sum();
        prop_assert_eq!(covered, n);
        prop_assert_eq!(g.get_statistics().community_count, communities.len());
    }

    #[test]
    fn prop_shortest_path_is_a_real_walk((n, edges) in graph_strategy(), a in 0usize..12, b in 0usize..12) {
        let g = build(n, &edges);
        let (from, to) = (format!("n{a}"), format!("n{b}"));
        if let Some(path) = g.shortest_path(&from, &to) {
            prop_assert_eq!(path.first(), Some(&from));
            prop_assert_eq!(path.last(), Some(&to));
            for step in path.windows(2) {
                prop_assert!(!g.edges_between(&step[0], &step[1]).is_empty());
            }
        }
    }
}
