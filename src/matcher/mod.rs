//! # Identity Matcher
//!
//! Compares noisy identity signals and groups candidate records that
//! likely describe the same real-world entity.
//!
//! Every operation is pure and synchronous: same inputs, same bits out.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `strings` | Levenshtein, Jaro–Winkler, Soundex, Metaphone |
//! | `fields` | email / phone / username / name / biographical comparison |
//! | `cluster` | weighted multi-signal match and single-pass clustering |

pub mod strings;
pub mod fields;
pub mod cluster;
pub mod config;
pub mod record;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Value;

pub use cluster::{ClusterMember, IdentityCluster};
pub use config::{MatchWeights, MatcherConfig};
pub use record::IdentityRecord;

// ============================================================================
// Algorithm tag
// ============================================================================

/// Which comparison produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Exact,
    Levenshtein,
    JaroWinkler,
    Soundex,
    Metaphone,
    /// Field-level composite (biographical consistency, multi-signal).
    Semantic,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Exact => "EXACT",
            Algorithm::Levenshtein => "LEVENSHTEIN",
            Algorithm::JaroWinkler => "JARO_WINKLER",
            Algorithm::Soundex => "SOUNDEX",
            Algorithm::Metaphone => "METAPHONE",
            Algorithm::Semantic => "SEMANTIC",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MatchScore
// ============================================================================

/// Result of one comparison. Produced fresh per call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub algorithm: Algorithm,
    /// Similarity in `[0, 1]`.
    pub score: f64,
    /// Confidence in `[0, 100]`.
    pub confidence: f64,
    pub details: BTreeMap<String, Value>,
    pub reasoning: String,
}

impl MatchScore {
    /// Score with an explicit confidence tier.
    pub fn new(algorithm: Algorithm, score: f64, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            algorithm,
            score: unit(score),
            confidence: if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 100.0) },
            details: BTreeMap::new(),
            reasoning: reasoning.into(),
        }
    }

    /// Score whose confidence is `score * 100`.
    pub fn scaled(algorithm: Algorithm, score: f64, reasoning: impl Into<String>) -> Self {
        let score = unit(score);
        Self::new(algorithm, score, score * 100.0, reasoning)
    }

    /// Zero score, zero confidence.
    pub fn none(algorithm: Algorithm, reasoning: impl Into<String>) -> Self {
        Self::new(algorithm, 0.0, 0.0, reasoning)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Whether the confidence reaches `threshold` (0–100).
    pub fn is_match(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

// ============================================================================
// Matcher
// ============================================================================

/// Entry point for all comparisons. Cheap to copy; holds only config.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Compare two raw strings with the primitive named by `algorithm`.
    ///
    /// Phonetic algorithms score 1.0 when the keys agree and 0.0 otherwise.
    /// `Semantic` has no raw-string meaning and falls back to exact comparison.
    pub fn compare_strings(&self, a: &str, b: &str, algorithm: Algorithm) -> MatchScore {
        match algorithm {
            Algorithm::Exact | Algorithm::Semantic => {
                if a == b {
                    MatchScore::scaled(algorithm, 1.0, "strings are identical")
                } else {
                    MatchScore::none(algorithm, "strings differ")
                }
            }
            Algorithm::Levenshtein => {
                let ratio = strings::levenshtein_ratio(a, b);
                MatchScore::scaled(algorithm, ratio, format!("levenshtein ratio {ratio:.3}"))
                    .with_detail("distance", strings::levenshtein_distance(a, b) as i64)
            }
            Algorithm::JaroWinkler => {
                let sim = strings::jaro_winkler(a, b);
                MatchScore::scaled(algorithm, sim, format!("jaro-winkler similarity {sim:.3}"))
            }
            Algorithm::Soundex => phonetic(algorithm, strings::soundex(a), strings::soundex(b)),
            Algorithm::Metaphone => phonetic(algorithm, strings::metaphone(a), strings::metaphone(b)),
        }
    }
}

fn phonetic(algorithm: Algorithm, key_a: String, key_b: String) -> MatchScore {
    let score = if !key_a.is_empty() && key_a == key_b {
        MatchScore::scaled(algorithm, 1.0, "phonetic keys agree")
    } else {
        MatchScore::none(algorithm, "phonetic keys differ")
    };
    score.with_detail("key_a", key_a).with_detail("key_b", key_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_strings_dispatch() {
        let m = Matcher::default();
        assert_eq!(m.compare_strings("abc", "abc", Algorithm::Exact).confidence, 100.0);
        assert_eq!(m.compare_strings("abc", "abd", Algorithm::Exact).score, 0.0);

        let lev = m.compare_strings("kitten", "sitting", Algorithm::Levenshtein);
        assert_eq!(lev.details.get("distance"), Some(&Value::Int(3)));

        let sx = m.compare_strings("Robert", "Rupert", Algorithm::Soundex);
        assert_eq!(sx.score, 1.0);
        assert_eq!(sx.details.get("key_a"), Some(&Value::from("R163")));

        let mp = m.compare_strings("Philip", "Filip", Algorithm::Metaphone);
        assert_eq!(mp.score, 1.0);
    }

    #[test]
    fn test_phonetic_empty_keys_do_not_match() {
        let m = Matcher::default();
        assert_eq!(m.compare_strings("123", "456", Algorithm::Soundex).score, 0.0);
    }

    #[test]
    fn test_match_score_bounds() {
        let s = MatchScore::scaled(Algorithm::JaroWinkler, 1.7, "x");
        assert_eq!(s.score, 1.0);
        assert_eq!(s.confidence, 100.0);
        let s = MatchScore::new(Algorithm::Exact, 0.5, -3.0, "x");
        assert_eq!(s.confidence, 0.0);
        assert!(!s.is_match(1.0));
    }
}
