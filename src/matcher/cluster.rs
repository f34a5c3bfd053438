//! Weighted multi-signal matching and single-pass record clustering.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::model::Value;
use super::{Algorithm, IdentityRecord, MatchScore, Matcher};

/// One record's membership in a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    /// Index into the input slice.
    pub index: usize,
    /// Multi-signal confidence against the seed; 100 for the seed itself.
    pub confidence: f64,
}

/// Records believed to describe one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityCluster {
    pub seed: usize,
    /// Seed first, then joiners in input order.
    pub members: Vec<ClusterMember>,
}

impl IdentityCluster {
    fn seeded(seed: usize) -> Self {
        Self {
            seed,
            members: vec![ClusterMember { index: seed, confidence: 100.0 }],
        }
    }

    pub fn indices(&self) -> Vec<usize> {
        self.members.iter().map(|m| m.index).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.iter().any(|m| m.index == index)
    }
}

impl Matcher {
    /// Weighted match across every signal present on both records.
    ///
    /// Confidence is `Σ(score·weight) / Σ(weight of compared signals) · 100`.
    /// With no signal in common the confidence is 0; unlike biographical
    /// consistency there is no neutral fallback here.
    pub fn multi_signal_match(&self, a: &IdentityRecord, b: &IdentityRecord) -> MatchScore {
        let weights = self.config.weights;
        let mut weighted = 0.0;
        let mut weight_total = 0.0;
        let mut details = Vec::new();

        let mut add = |field: &'static str, score: MatchScore, weight: f64| {
            weighted += score.score * weight;
            weight_total += weight;
            details.push((field, score.score));
        };

        if let (Some(x), Some(y)) = (a.name_signal(), b.name_signal()) {
            add("name", self.name_similarity(x, y), weights.name);
        }
        if let (Some(x), Some(y)) = (a.email_signal(), b.email_signal()) {
            add("email", self.email_similarity(x, y), weights.email);
        }
        if let (Some(x), Some(y)) = (a.phone_signal(), b.phone_signal()) {
            add("phone", self.phone_similarity(x, y), weights.phone);
        }
        if let (Some(x), Some(y)) = (a.username_signal(), b.username_signal()) {
            add("username", self.username_similarity(x, y), weights.username);
        }
        if !a.biographical.is_empty() && !b.biographical.is_empty() {
            add(
                "biographical",
                self.biographical_consistency(&a.biographical, &b.biographical),
                weights.biographical,
            );
        }

        if details.is_empty() || weight_total <= 0.0 {
            return MatchScore::none(Algorithm::Semantic, "no comparable fields");
        }

        let confidence = weighted / weight_total * 100.0;
        let fields: Vec<&str> = details.iter().map(|(f, _)| *f).collect();
        let mut score = MatchScore::new(
            Algorithm::Semantic,
            confidence / 100.0,
            confidence,
            format!("weighted match over {}", fields.join(", ")),
        );
        for (field, field_score) in details {
            score.details.insert(field.to_string(), Value::Float(field_score));
        }
        score
    }

    /// Group candidate records that likely describe the same entity.
    ///
    /// Single linear pass: each unassigned record seeds a cluster, and every
    /// later unassigned record joins it if its multi-signal confidence
    /// against the seed reaches `cluster_threshold`. Records are only ever
    /// compared to seeds and clusters are never merged afterwards, so a
    /// record stays with the first seed it matches even if a later seed
    /// would fit better.
    pub fn cluster(&self, records: &[IdentityRecord]) -> Vec<IdentityCluster> {
        let threshold = self.config.cluster_threshold;
        let mut assigned = vec![false; records.len()];
        let mut clusters = Vec::new();

        for seed in 0..records.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut cluster = IdentityCluster::seeded(seed);

            for candidate in seed + 1..records.len() {
                if assigned[candidate] {
                    continue;
                }
                let m = self.multi_signal_match(&records[seed], &records[candidate]);
                trace!(seed, candidate, confidence = m.confidence, "cluster comparison");
                if m.confidence >= threshold {
                    assigned[candidate] = true;
                    cluster.members.push(ClusterMember { index: candidate, confidence: m.confidence });
                }
            }
            clusters.push(cluster);
        }

        debug!(records = records.len(), clusters = clusters.len(), "clustered candidate records");
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatcherConfig;

    #[test]
    fn test_no_shared_fields_is_zero() {
        let a = IdentityRecord::new().name("Ada Lovelace");
        let b = IdentityRecord::new().email("ada@example.org");
        let s = Matcher::default().multi_signal_match(&a, &b);
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.reasoning, "no comparable fields");
    }

    #[test]
    fn test_weights_only_over_compared_fields() {
        let a = IdentityRecord::new().name("John Smith").phone("4155550100");
        let b = IdentityRecord::new().name("Smith John").phone("+1 415 555 0100");
        let s = Matcher::default().multi_signal_match(&a, &b);
        // (0.95*0.30 + 1.0*0.20) / 0.50
        assert!((s.confidence - 97.0).abs() < 1e-9, "{s:?}");
        assert_eq!(s.details.len(), 2);
    }

    #[test]
    fn test_custom_weights() {
        let mut cfg = MatcherConfig::default();
        cfg.weights.name = 0.0;
        cfg.weights.email = 1.0;
        let a = IdentityRecord::new().name("Alice").email("x@corp.io");
        let b = IdentityRecord::new().name("Zed").email("x@corp.io");
        let s = Matcher::new(cfg).multi_signal_match(&a, &b);
        assert_eq!(s.confidence, 100.0);
    }

    #[test]
    fn test_cluster_singletons() {
        let records = vec![
            IdentityRecord::new().email("a@one.io"),
            IdentityRecord::new().email("b@two.io"),
        ];
        let clusters = Matcher::default().cluster(&records);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].indices(), vec![0]);
        assert_eq!(clusters[1].indices(), vec![1]);
    }

    #[test]
    fn test_cluster_empty_input() {
        assert!(Matcher::default().cluster(&[]).is_empty());
    }
}
