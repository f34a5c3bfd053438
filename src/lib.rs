//! # identity-graph — identity matching and relationship-graph analytics
//!
//! Reconciles fragments of identity evidence about people, organizations
//! and infrastructure into a graph of entities and relationships, then
//! ranks, connects and clusters that graph.
//!
//! ## Design Principles
//!
//! 1. **Two independent components**: the [`Matcher`] decides which records
//!    are the same entity, the [`RelationshipGraph`] stores and analyses
//!    what the caller resolved. Neither calls the other.
//! 2. **Pure and in-memory**: no I/O, no async, no hidden randomness.
//!    Identical inputs give bit-identical outputs.
//! 3. **Misses are values**: lookups return `Option`, rejected edges return
//!    [`Error::UnknownNode`]. Nothing here panics on caller input.
//!
//! ## Quick Start
//!
//! ```rust
//! use identity_graph::{IdentityRecord, Matcher, NewEdge, NewNode, RelationshipGraph, RelationshipType};
//!
//! # fn example() -> identity_graph::Result<()> {
//! let records = vec![
//!     IdentityRecord::new().name("John Smith").email("j.smith+news@gmail.com"),
//!     IdentityRecord::new().name("Smith John").email("j.smith@googlemail.com"),
//!     IdentityRecord::new().name("Mary Jones").phone("415 555 0100"),
//! ];
//! let clusters = Matcher::default().cluster(&records);
//! assert_eq!(clusters.len(), 2);
//!
//! let mut graph = RelationshipGraph::new();
//! graph.upsert_node(NewNode::new("person:jsmith", "PERSON").source("search"));
//! graph.upsert_node(NewNode::new("domain:smith.io", "DOMAIN").source("whois"));
//! graph.add_edge(
//!     NewEdge::new("person:jsmith", "domain:smith.io", RelationshipType::Owns)
//!         .strength(0.9)
//!         .confidence(0.7)
//!         .connector("whois"),
//! )?;
//! assert_eq!(graph.shortest_path("person:jsmith", "domain:smith.io").map(|p| p.len()), Some(2));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod matcher;
pub mod graph;
pub mod export;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    EntityNode, NewNode, EntityEdge, NewEdge, EdgeId,
    RelationshipType, EdgeType, Value, PropertyMap, properties,
};

// ============================================================================
// Re-exports: Matcher
// ============================================================================

pub use matcher::{
    Algorithm, MatchScore, Matcher, MatcherConfig, MatchWeights,
    IdentityRecord, IdentityCluster, ClusterMember,
};

// ============================================================================
// Re-exports: Graph & export
// ============================================================================

pub use graph::{RelationshipGraph, SharedGraph, GraphStatistics, PageRankConfig, top_ranked};
pub use export::{GraphSnapshot, write_graphml, to_graphml_string};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown node: {id}")]
    UnknownNode { id: String },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
