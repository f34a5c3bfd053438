//! Entity edge: an observed or inferred relationship between two nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value};
use super::node::clamp_unit;

/// Opaque edge identifier, generated by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of relationship an edge asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    SameIdentity,
    Knows,
    WorksWith,
    Family,
    Owns,
    Manages,
    Associated,
    Financial,
    Residence,
    Communication,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::SameIdentity => "SAME_IDENTITY",
            RelationshipType::Knows => "KNOWS",
            RelationshipType::WorksWith => "WORKS_WITH",
            RelationshipType::Family => "FAMILY",
            RelationshipType::Owns => "OWNS",
            RelationshipType::Manages => "MANAGES",
            RelationshipType::Associated => "ASSOCIATED",
            RelationshipType::Financial => "FINANCIAL",
            RelationshipType::Residence => "RESIDENCE",
            RelationshipType::Communication => "COMMUNICATION",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the edge came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// Observed by a connector.
    Direct,
    /// Deduced by the caller (e.g. from matcher output).
    Inferred,
    /// Synthesized from a chain of two same-typed edges.
    Transitive,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Direct => "DIRECT",
            EdgeType::Inferred => "INFERRED",
            EdgeType::Transitive => "TRANSITIVE",
        }
    }
}

/// A directed relationship. Parallel edges and self-loops are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEdge {
    pub id: EdgeId,
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: RelationshipType,
    pub edge_type: EdgeType,
    /// How close the relationship is, `[0, 1]`.
    pub strength: f64,
    /// How sure we are it exists, `[0, 1]`.
    pub confidence: f64,
    pub metadata: PropertyMap,
    pub source_connector: String,
    pub created_at: DateTime<Utc>,
}

/// Insert request for an edge.
///
/// Also the shape in which inferred candidates are handed back, so a
/// caller can feed them straight into `add_edge`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdge {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: RelationshipType,
    pub edge_type: EdgeType,
    pub strength: f64,
    pub confidence: f64,
    pub metadata: PropertyMap,
    pub source_connector: String,
}

impl NewEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type,
            edge_type: EdgeType::Direct,
            strength: 1.0,
            confidence: 1.0,
            metadata: PropertyMap::new(),
            source_connector: String::new(),
        }
    }

    pub fn edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn connector(mut self, connector: impl Into<String>) -> Self {
        self.source_connector = connector.into();
        self
    }

    pub(crate) fn into_edge(self, id: EdgeId, created_at: DateTime<Utc>) -> EntityEdge {
        EntityEdge {
            id,
            source_id: self.source_id,
            target_id: self.target_id,
            relationship_type: self.relationship_type,
            edge_type: self.edge_type,
            strength: clamp_unit(self.strength),
            confidence: clamp_unit(self.confidence),
            metadata: self.metadata,
            source_connector: self.source_connector,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_type_serde_names() {
        for rel in [RelationshipType::SameIdentity, RelationshipType::WorksWith, RelationshipType::Communication] {
            let json = serde_json::to_string(&rel).unwrap();
            assert_eq!(json, format!("\"{}\"", rel.as_str()));
        }
        assert_eq!(serde_json::to_string(&EdgeType::Transitive).unwrap(), "\"TRANSITIVE\"");
    }

    #[test]
    fn test_into_edge_clamps() {
        let edge = NewEdge::new("a", "b", RelationshipType::Owns)
            .strength(1.5)
            .confidence(-0.2)
            .into_edge(EdgeId(7), Utc::now());
        assert_eq!(edge.strength, 1.0);
        assert_eq!(edge.confidence, 0.0);
        assert_eq!(edge.edge_type, EdgeType::Direct);
    }
}
