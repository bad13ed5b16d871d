//! The scoring pipeline: one batch pass from source tables to result tables.
//!
//! EXECUTION ORDER (fixed):
//!   1. Feature aggregation (sales trend, claim severity, engagement, inventory)
//!   2. Cohort join + cohort statistics
//!   3. Health scoring
//!   4. Churn estimation (reuses the claim severity aggregate from step 1)
//!   5. Feedback sentiment
//!   6. Demand forecast
//!
//! RULES:
//!   - No stage mutates an input table; every stage returns a new table.
//!   - Stages only compose through dealer_id.
//!   - Nothing is cached between runs.

use crate::{
    churn::{self, DealerChurn},
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
    features,
    forecast::{self, ForecastRequest, ForecastRow},
    health::{self, DealerHealth},
    loader::{SourceTables, TableSource},
    sentiment::{self, DealerSentiment, LexiconScorer, ScoredFeedback, SentimentScorer},
};
use serde::{Deserialize, Serialize};

/// Every result table of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub health:    Vec<DealerHealth>,
    pub churn:     Vec<DealerChurn>,
    pub sentiment: Vec<DealerSentiment>,
    pub feedback:  Vec<ScoredFeedback>,
    pub forecast:  Vec<ForecastRow>,
}

pub struct ScoringPipeline {
    config: PipelineConfig,
    scorer: Box<dyn SentimentScorer>,
}

impl ScoringPipeline {
    /// Build a pipeline with the lexicon scorer from `config`.
    /// Rejects invalid configurations up front.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate().map_err(|reason| PipelineError::Config {
            path: "<in-memory>".into(),
            reason,
        })?;

        let scorer = Box::new(LexiconScorer::from_config(&config.sentiment));
        Ok(Self { config, scorer })
    }

    /// Pipeline with the canonical constants.
    pub fn standard() -> Self {
        let config = PipelineConfig::standard();
        let scorer = Box::new(LexiconScorer::from_config(&config.sentiment));
        Self { config, scorer }
    }

    /// Swap the comment scorer, e.g. for a real classifier.
    pub fn with_scorer(mut self, scorer: Box<dyn SentimentScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load from `source`, then run. A load failure means no output at all.
    pub fn run_source<S: TableSource + ?Sized>(
        &self,
        source: &S,
        request: &ForecastRequest,
    ) -> PipelineResult<PipelineOutput> {
        let tables = source.load_tables()?;
        Ok(self.run(&tables, request))
    }

    pub fn run(&self, tables: &SourceTables, request: &ForecastRequest) -> PipelineOutput {
        let unknown = tables.unknown_dealer_ids();
        if !unknown.is_empty() {
            log::warn!(
                "pipeline: {} dealer ids missing from master data, scored as independent accounts",
                unknown.len(),
            );
        }

        let health_cfg = &self.config.health;

        // 1. Aggregation
        let trends = features::sales_trend(&tables.sales, health_cfg.trend_window_months);
        let claims = features::claim_severity(&tables.claims);
        let engagement =
            features::engagement_intensity(&tables.engagement, health_cfg.engagement_window_days);
        let inventory = features::inventory_risk(&tables.inventory);

        // 2–3. Cohort + health
        let cohort = health::join_features(&trends, &claims, &engagement, &inventory);
        let health = health::score_cohort(&cohort, health_cfg);

        // 4. Churn
        let churn = churn::estimate_churn(&health, &claims, &self.config.churn);

        // 5. Sentiment
        let feedback =
            sentiment::enrich_feedback(&tables.feedback, &*self.scorer, &self.config.sentiment);
        let sentiment = sentiment::aggregate_dealer_sentiment(&feedback);

        // 6. Forecast
        let forecast = forecast::forecast_demand(&tables.sales, request, &self.config.forecast);

        log::info!(
            "pipeline: scored {} dealers, {} with sentiment, {} forecast rows",
            health.len(),
            sentiment.len(),
            forecast.len(),
        );

        PipelineOutput { health, churn, sentiment, feedback, forecast }
    }
}
