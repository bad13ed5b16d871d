//! Churn estimation from inverse health plus a claim-severity bump.
//!
//!   base_churn        = 1 − health_score / 100
//!   churn_probability = clamp(base_churn + severity_weight × avg_severity / max_severity, 0, 1)
//!
//! Unlike the health score, the probability is hard-clamped: the additive
//! severity bump can push it past 1.

use crate::{
    config::{ChurnBucketEdges, ChurnModelConfig},
    features::ClaimSeverity,
    health::DealerHealth,
    types::DealerId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    pub fn classify(probability: f64, edges: &ChurnBucketEdges) -> Self {
        if probability <= edges.low_max {
            Self::Low
        } else if probability <= edges.medium_max {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low    => "Low",
            Self::Medium => "Medium",
            Self::High   => "High",
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerChurn {
    pub dealer_id:         DealerId,
    pub churn_probability: f64,
    pub risk_bucket:       RiskBucket,
}

// ── Estimation ───────────────────────────────────────────────────────────────

/// Probability for a single dealer. `avg_severity` is 0 for a dealer
/// without claims.
pub fn churn_probability(health_score: f64, avg_severity: f64, config: &ChurnModelConfig) -> f64 {
    let base_churn = 1.0 - health_score / 100.0;
    let severity_bump = config.severity_weight * (avg_severity / config.max_severity);
    (base_churn + severity_bump).clamp(0.0, 1.0)
}

/// One churn row per health row, in the same order. Claims for dealers
/// outside the health cohort are ignored.
pub fn estimate_churn(
    health: &[DealerHealth],
    claims: &[ClaimSeverity],
    config: &ChurnModelConfig,
) -> Vec<DealerChurn> {
    let severity: HashMap<&str, f64> = claims
        .iter()
        .map(|c| (c.dealer_id.as_str(), c.avg_claim_severity))
        .collect();

    let churn: Vec<DealerChurn> = health
        .iter()
        .map(|h| {
            let avg_severity = severity.get(h.dealer_id.as_str()).copied().unwrap_or(0.0);
            let churn_probability = churn_probability(h.health_score, avg_severity, config);
            DealerChurn {
                dealer_id: h.dealer_id.clone(),
                churn_probability,
                risk_bucket: RiskBucket::classify(churn_probability, &config.buckets),
            }
        })
        .collect();

    log::debug!(
        "churn: estimated {} dealers ({} high risk)",
        churn.len(),
        churn.iter().filter(|c| c.risk_bucket == RiskBucket::High).count(),
    );
    churn
}
