//! Scoring constants.
//!
//! RULE: no scoring component hardcodes a constant. Every number that
//! shapes a score is read from `PipelineConfig`, so tests can pin it and
//! deployments can tune it from `data/config/scoring.json`.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ── Health model ─────────────────────────────────────────────────────────────

/// Longest accepted CRM look-back, one hundred years.
pub const MAX_ENGAGEMENT_WINDOW_DAYS: i64 = 36_500;

/// Composite weights. They must sum to 1.0 before the ×100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthWeights {
    pub sales_trend:      f64,
    pub engagement:       f64,
    pub claim_severity:   f64,
    pub inventory_ageing: f64,
}

impl HealthWeights {
    pub fn total(&self) -> f64 {
        self.sales_trend + self.engagement + self.claim_severity + self.inventory_ageing
    }
}

/// Upper edges (inclusive) of the two lower health buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBucketEdges {
    pub high_risk_max: f64,
    pub watchlist_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthModelConfig {
    pub weights:                HealthWeights,
    pub buckets:                HealthBucketEdges,
    /// Length of the trailing sum compared against the prior window.
    pub trend_window_months:    usize,
    /// CRM look-back, counted back from the latest event in the data set.
    pub engagement_window_days: i64,
}

// ── Churn model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnBucketEdges {
    pub low_max:    f64,
    pub medium_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnModelConfig {
    /// Additive bump applied at the worst average claim severity.
    pub severity_weight: f64,
    /// The severity value that maps to the full bump.
    pub max_severity:    f64,
    pub buckets:         ChurnBucketEdges,
}

// ── Sentiment ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Lower-case token → polarity. Exact match, no stemming.
    pub lexicon:            BTreeMap<String, Polarity>,
    /// Scores strictly above this are labeled positive.
    pub positive_threshold: f64,
    /// Scores strictly below this are labeled negative.
    pub negative_threshold: f64,
}

// ── Forecast ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// How many of the most recent months feed the flat mean.
    pub lookback_months:        usize,
    /// Default number of months projected when the caller names none.
    pub horizon_months:         u32,
    /// Dealer/model pairs with fewer observed months are skipped.
    /// 1 extrapolates from whatever history exists.
    pub minimum_history_months: usize,
    pub round_decimals:         u32,
}

// ── Root ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub health:    HealthModelConfig,
    pub churn:     ChurnModelConfig,
    pub sentiment: SentimentConfig,
    pub forecast:  ForecastConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl PipelineConfig {
    /// Location of the config file relative to a data directory.
    pub const RELATIVE_PATH: &'static str = "config/scoring.json";

    /// Load from `{data_dir}/config/scoring.json`.
    /// In tests, use `PipelineConfig::standard()`.
    pub fn load(data_dir: impl AsRef<Path>) -> PipelineResult<Self> {
        Self::load_file(data_dir.as_ref().join(Self::RELATIVE_PATH))
    }

    pub fn load_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let config_error = |reason: String| PipelineError::Config {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("cannot read file: {e}")))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| config_error(format!("cannot parse: {e}")))?;
        config.validate().map_err(config_error)?;

        log::debug!("loaded scoring config from {}", path.display());
        Ok(config)
    }

    /// Reject configurations that would make scores meaningless.
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.health.weights;
        if [w.sales_trend, w.engagement, w.claim_severity, w.inventory_ageing]
            .iter()
            .any(|v| *v < 0.0)
        {
            return Err("health weights must be non-negative".into());
        }
        if (w.total() - 1.0).abs() > 1e-9 {
            return Err(format!("health weights must sum to 1.0, got {}", w.total()));
        }

        let hb = &self.health.buckets;
        if hb.high_risk_max >= hb.watchlist_max {
            return Err("health bucket edges must be strictly increasing".into());
        }
        if self.health.trend_window_months == 0 {
            return Err("trend_window_months must be at least 1".into());
        }
        if !(0..=MAX_ENGAGEMENT_WINDOW_DAYS).contains(&self.health.engagement_window_days) {
            return Err(format!(
                "engagement_window_days must be in 0..={MAX_ENGAGEMENT_WINDOW_DAYS}, got {}",
                self.health.engagement_window_days,
            ));
        }

        let cb = &self.churn.buckets;
        if cb.low_max >= cb.medium_max {
            return Err("churn bucket edges must be strictly increasing".into());
        }
        if self.churn.max_severity <= 0.0 {
            return Err("max_severity must be positive".into());
        }

        if self.sentiment.negative_threshold > self.sentiment.positive_threshold {
            return Err("negative_threshold must not exceed positive_threshold".into());
        }
        if self.sentiment.lexicon.keys().any(|t| t != &t.to_lowercase()) {
            return Err("lexicon tokens must be lower-case".into());
        }

        if self.forecast.lookback_months == 0 {
            return Err("lookback_months must be at least 1".into());
        }

        Ok(())
    }

    /// The canonical constants of the scoring model.
    pub fn standard() -> Self {
        const POSITIVE: &[&str] = &[
            "good", "satisfied", "appreciated", "timely",
            "support", "strong", "happy", "excellent",
        ];
        const NEGATIVE: &[&str] = &[
            "delay", "delays", "insufficient", "bad", "poor",
            "complaint", "complaints", "issue", "problem", "pressure",
            "trust", "negative",
        ];

        let lexicon = POSITIVE
            .iter()
            .map(|t| (t.to_string(), Polarity::Positive))
            .chain(NEGATIVE.iter().map(|t| (t.to_string(), Polarity::Negative)))
            .collect();

        Self {
            health: HealthModelConfig {
                weights: HealthWeights {
                    sales_trend:      0.35,
                    engagement:       0.25,
                    claim_severity:   0.20,
                    inventory_ageing: 0.20,
                },
                buckets: HealthBucketEdges {
                    high_risk_max: 40.0,
                    watchlist_max: 70.0,
                },
                trend_window_months:    3,
                engagement_window_days: 90,
            },
            churn: ChurnModelConfig {
                severity_weight: 0.1,
                max_severity:    3.0,
                buckets: ChurnBucketEdges {
                    low_max:    0.33,
                    medium_max: 0.66,
                },
            },
            sentiment: SentimentConfig {
                lexicon,
                positive_threshold: 0.2,
                negative_threshold: -0.2,
            },
            forecast: ForecastConfig {
                lookback_months:        3,
                horizon_months:         3,
                minimum_history_months: 1,
                round_decimals:         1,
            },
        }
    }
}
