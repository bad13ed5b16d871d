//! Dealer health scoring: a weighted composite of four cohort-relative signals.
//!
//! Scoring runs in two passes:
//!   1. Reduction: join the four feature aggregates into one row per dealer
//!      and observe the cohort-wide range of every normalized signal.
//!   2. Per-dealer scoring: each row is scored against those ranges, which
//!      are read-only from here on.
//!
//! health_score = 100 × (w_trend·norm(trend) + w_engage·norm(engagement)
//!                      + w_claim·(1 − norm(severity)) + w_age·(1 − norm(ageing)))
//!
//! The score is bounded by construction and is not clamped.

use crate::{
    config::{HealthBucketEdges, HealthModelConfig},
    features::{
        self, ClaimSeverity, EngagementIntensity, InventoryRisk, SalesTrend,
    },
    normalize::FeatureRange,
    records::{EngagementEvent, InventoryRecord, SalesRecord, WarrantyClaim},
    types::DealerId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthBucket {
    #[serde(rename = "High Risk")]
    HighRisk,
    Watchlist,
    Healthy,
}

impl HealthBucket {
    /// Edges are inclusive on the upper side: a score equal to
    /// `high_risk_max` is still high risk.
    pub fn classify(score: f64, edges: &HealthBucketEdges) -> Self {
        if score <= edges.high_risk_max {
            Self::HighRisk
        } else if score <= edges.watchlist_max {
            Self::Watchlist
        } else {
            Self::Healthy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HighRisk  => "High Risk",
            Self::Watchlist => "Watchlist",
            Self::Healthy   => "Healthy",
        }
    }
}

impl fmt::Display for HealthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerHealth {
    pub dealer_id:     DealerId,
    pub health_score:  f64,
    pub health_bucket: HealthBucket,
}

/// One dealer's raw signals after the outer join, gaps filled with 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerFeatures {
    pub dealer_id:          DealerId,
    pub sales_trend:        f64,
    pub avg_claim_severity: f64,
    pub claim_frequency:    usize,
    pub recent_engagements: f64,
    pub avg_duration_mins:  f64,
    pub avg_stock_units:    f64,
    pub avg_ageing_days:    f64,
}

impl DealerFeatures {
    fn empty(dealer_id: DealerId) -> Self {
        Self {
            dealer_id,
            sales_trend:        0.0,
            avg_claim_severity: 0.0,
            claim_frequency:    0,
            recent_engagements: 0.0,
            avg_duration_mins:  0.0,
            avg_stock_units:    0.0,
            avg_ageing_days:    0.0,
        }
    }
}

/// Cohort-wide ranges of the four normalized signals. `None` means the
/// cohort is empty for that signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortStatistics {
    pub sales_trend:    Option<FeatureRange>,
    pub claim_severity: Option<FeatureRange>,
    pub engagement:     Option<FeatureRange>,
    pub ageing:         Option<FeatureRange>,
}

impl CohortStatistics {
    pub fn observe(cohort: &[DealerFeatures]) -> Self {
        let range = |pick: fn(&DealerFeatures) -> f64| {
            FeatureRange::observe(cohort.iter().map(|row| Some(pick(row))))
        };

        Self {
            sales_trend:    range(|r| r.sales_trend),
            claim_severity: range(|r| r.avg_claim_severity),
            engagement:     range(|r| r.recent_engagements),
            ageing:         range(|r| r.avg_ageing_days),
        }
    }
}

// ── Reduction pass ───────────────────────────────────────────────────────────

/// Outer join on dealer_id. A dealer present in any aggregate gets a row;
/// signals it has no data for are filled with 0.
pub fn join_features(
    trends:     &[SalesTrend],
    claims:     &[ClaimSeverity],
    engagement: &[EngagementIntensity],
    inventory:  &[InventoryRisk],
) -> Vec<DealerFeatures> {
    let dealer_ids: BTreeSet<&str> = trends
        .iter()
        .map(|r| r.dealer_id.as_str())
        .chain(claims.iter().map(|r| r.dealer_id.as_str()))
        .chain(engagement.iter().map(|r| r.dealer_id.as_str()))
        .chain(inventory.iter().map(|r| r.dealer_id.as_str()))
        .collect();

    let mut joined: BTreeMap<&str, DealerFeatures> = dealer_ids
        .into_iter()
        .map(|id| (id, DealerFeatures::empty(id.to_string())))
        .collect();

    for row in trends {
        if let Some(f) = joined.get_mut(row.dealer_id.as_str()) {
            f.sales_trend = row.sales_trend.unwrap_or(0.0);
        }
    }
    for row in claims {
        if let Some(f) = joined.get_mut(row.dealer_id.as_str()) {
            f.avg_claim_severity = row.avg_claim_severity;
            f.claim_frequency = row.claim_frequency;
        }
    }
    for row in engagement {
        if let Some(f) = joined.get_mut(row.dealer_id.as_str()) {
            f.recent_engagements = row.recent_engagements as f64;
            f.avg_duration_mins = row.avg_duration_mins;
        }
    }
    for row in inventory {
        if let Some(f) = joined.get_mut(row.dealer_id.as_str()) {
            f.avg_stock_units = row.avg_stock_units;
            f.avg_ageing_days = row.avg_ageing_days;
        }
    }

    joined.into_values().collect()
}

// ── Scoring pass ─────────────────────────────────────────────────────────────

pub struct HealthScorer<'a> {
    config: &'a HealthModelConfig,
    stats:  CohortStatistics,
}

impl<'a> HealthScorer<'a> {
    pub fn new(config: &'a HealthModelConfig, stats: CohortStatistics) -> Self {
        Self { config, stats }
    }

    pub fn score(&self, features: &DealerFeatures) -> DealerHealth {
        let w = &self.config.weights;
        let scale = |range: Option<FeatureRange>, value: f64| {
            range.map_or(crate::normalize::NEUTRAL, |r| r.scale(Some(value)))
        };

        let trend_component  = scale(self.stats.sales_trend, features.sales_trend);
        let engage_component = scale(self.stats.engagement, features.recent_engagements);
        let claim_component  = 1.0 - scale(self.stats.claim_severity, features.avg_claim_severity);
        let age_component    = 1.0 - scale(self.stats.ageing, features.avg_ageing_days);

        let health_score = 100.0
            * (w.sales_trend * trend_component
                + w.engagement * engage_component
                + w.claim_severity * claim_component
                + w.inventory_ageing * age_component);

        DealerHealth {
            dealer_id: features.dealer_id.clone(),
            health_score,
            health_bucket: HealthBucket::classify(health_score, &self.config.buckets),
        }
    }
}

/// Score a joined cohort. One output row per input row, same order.
pub fn score_cohort(cohort: &[DealerFeatures], config: &HealthModelConfig) -> Vec<DealerHealth> {
    let scorer = HealthScorer::new(config, CohortStatistics::observe(cohort));
    let scored: Vec<DealerHealth> = cohort.iter().map(|f| scorer.score(f)).collect();

    log::debug!(
        "health: scored {} dealers ({} high risk)",
        scored.len(),
        scored.iter().filter(|h| h.health_bucket == HealthBucket::HighRisk).count(),
    );
    scored
}

/// Aggregate the raw tables and score every dealer that appears in any
/// of them.
pub fn compute_health_score(
    sales:     &[SalesRecord],
    claims:    &[WarrantyClaim],
    events:    &[EngagementEvent],
    inventory: &[InventoryRecord],
    config:    &HealthModelConfig,
) -> Vec<DealerHealth> {
    let cohort = join_features(
        &features::sales_trend(sales, config.trend_window_months),
        &features::claim_severity(claims),
        &features::engagement_intensity(events, config.engagement_window_days),
        &features::inventory_risk(inventory),
    );
    score_cohort(&cohort, config)
}
