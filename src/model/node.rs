//! Entity node: a resolved identity or infrastructure object.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value};

/// A resolved entity in the relationship graph.
///
/// `entity_type` is an open tag (`PERSON`, `COMPANY`, `DOMAIN`, ...); the
/// graph never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityNode {
    pub id: String,
    pub entity_type: String,
    pub attributes: PropertyMap,
    /// Certainty in `[0, 1]`. Never decreases across merges.
    pub confidence: f64,
    pub sources: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl EntityNode {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Fold an upsert into this node.
    ///
    /// Keys in the update overwrite, keys only present here survive,
    /// confidence rises to the max, sources union. `entity_type` and
    /// `created_at` keep their first-seen values.
    pub(crate) fn merge(&mut self, update: NewNode) {
        self.attributes.extend(update.attributes);
        self.confidence = self.confidence.max(clamp_unit(update.confidence));
        self.sources.extend(update.sources);
    }
}

/// Upsert request for a node.
///
/// ```
/// use identity_graph::NewNode;
///
/// let node = NewNode::new("p-1", "PERSON")
///     .attribute("name", "Ada Lovelace")
///     .confidence(0.8)
///     .source("whois");
/// assert_eq!(node.sources, vec!["whois".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub id: String,
    pub entity_type: String,
    pub attributes: PropertyMap,
    pub confidence: f64,
    pub sources: Vec<String>,
}

impl NewNode {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            attributes: PropertyMap::new(),
            confidence: 1.0,
            sources: Vec::new(),
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attributes(mut self, attributes: PropertyMap) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    pub(crate) fn into_node(self, created_at: DateTime<Utc>) -> EntityNode {
        EntityNode {
            id: self.id,
            entity_type: self.entity_type,
            attributes: self.attributes,
            confidence: clamp_unit(self.confidence),
            sources: self.sources.into_iter().collect(),
            tags: BTreeSet::new(),
            created_at,
        }
    }
}

/// Clamp into `[0, 1]`; NaN becomes 0.
pub(crate) fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> EntityNode {
        NewNode::new("n1", "PERSON")
            .attribute("name", "Ada")
            .attribute("city", "London")
            .confidence(0.7)
            .source("search")
            .into_node(Utc::now())
    }

    #[test]
    fn test_merge_preserves_missing_keys() {
        let mut node = base();
        node.merge(NewNode::new("n1", "PERSON").attribute("city", "Paris").attribute("age", 36));
        assert_eq!(node.get("name"), Some(&Value::from("Ada")));
        assert_eq!(node.get("city"), Some(&Value::from("Paris")));
        assert_eq!(node.get("age"), Some(&Value::Int(36)));
    }

    #[test]
    fn test_merge_confidence_never_drops() {
        let mut node = base();
        node.merge(NewNode::new("n1", "PERSON").confidence(0.2).source("whois"));
        assert_eq!(node.confidence, 0.7);
        node.merge(NewNode::new("n1", "PERSON").confidence(0.9));
        assert_eq!(node.confidence, 0.9);
        assert_eq!(node.sources.len(), 2);
    }

    #[test]
    fn test_merge_keeps_first_type() {
        let mut node = base();
        node.merge(NewNode::new("n1", "COMPANY"));
        assert_eq!(node.entity_type, "PERSON");
    }

    #[test]
    fn test_confidence_clamped() {
        let node = NewNode::new("x", "DOMAIN").confidence(7.0).into_node(Utc::now());
        assert_eq!(node.confidence, 1.0);
        let node = NewNode::new("x", "DOMAIN").confidence(f64::NAN).into_node(Utc::now());
        assert_eq!(node.confidence, 0.0);
    }
}
