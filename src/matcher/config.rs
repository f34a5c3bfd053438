//! Matcher configuration.

use serde::{Deserialize, Serialize};

/// Per-signal weights for multi-signal matching.
///
/// Weights are only summed over signals present on both records, so they
/// do not need to add up to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchWeights {
    pub name: f64,
    pub email: f64,
    pub phone: f64,
    pub username: f64,
    pub biographical: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            name: 0.30,
            email: 0.25,
            phone: 0.20,
            username: 0.15,
            biographical: 0.10,
        }
    }
}

/// Tunables for [`Matcher`](super::Matcher).
///
/// | Field | Default | Meaning |
/// |-------|---------|---------|
/// | `weights` | see [`MatchWeights`] | multi-signal weights |
/// | `cluster_threshold` | 75.0 | min confidence (0–100) to join a seed's cluster |
/// | `email_local_threshold` | 0.85 | local-part Jaro–Winkler needed on a shared domain |
/// | `fuzzy_threshold` | 0.80 | Jaro–Winkler above which names/usernames read as "similar" |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub weights: MatchWeights,
    pub cluster_threshold: f64,
    pub email_local_threshold: f64,
    pub fuzzy_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            weights: MatchWeights::default(),
            cluster_threshold: 75.0,
            email_local_threshold: 0.85,
            fuzzy_threshold: 0.80,
        }
    }
}
