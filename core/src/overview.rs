//! Portfolio views: pipeline output joined back onto dealer master data.
//!
//! These are the tables behind the executive overview and the account
//! explorer. They only read pipeline output and source tables.

use crate::{
    churn::{DealerChurn, RiskBucket},
    health::{DealerHealth, HealthBucket},
    loader::SourceTables,
    pipeline::PipelineOutput,
    records::{Dealer, DealerTier, EngagementEvent, WarrantyClaim},
    types::DealerId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// CRM rows shown on an account profile.
pub const RECENT_TOUCHPOINTS: usize = 20;

/// Accounts listed on the overview, highest churn first.
pub const TOP_RISK_ACCOUNTS: usize = 10;

// ── Portfolio overview ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAccount {
    pub dealer_id:         DealerId,
    pub dealer_name:       Option<String>,
    pub region:            String,
    pub tier:              DealerTier,
    pub health_score:      f64,
    pub health_bucket:     HealthBucket,
    pub churn_probability: f64,
    pub risk_bucket:       RiskBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    /// Size of the dealer master table.
    pub accounts:              usize,
    /// Master dealers that received scores.
    pub scored_accounts:       usize,
    pub avg_health_score:      Option<f64>,
    pub avg_churn_probability: Option<f64>,
    pub high_churn_accounts:   usize,
    pub top_risk:              Vec<RiskAccount>,
}

impl PortfolioOverview {
    /// Inner join of master data, health and churn. Dealers scored by the
    /// pipeline but absent from master data do not appear here.
    pub fn build(dealers: &[Dealer], output: &PipelineOutput, top_n: usize) -> Self {
        let health: HashMap<&str, &DealerHealth> =
            output.health.iter().map(|h| (h.dealer_id.as_str(), h)).collect();
        let churn: HashMap<&str, &DealerChurn> =
            output.churn.iter().map(|c| (c.dealer_id.as_str(), c)).collect();

        let mut scored: Vec<RiskAccount> = dealers
            .iter()
            .filter_map(|d| {
                let h = health.get(d.dealer_id.as_str())?;
                let c = churn.get(d.dealer_id.as_str())?;
                Some(RiskAccount {
                    dealer_id:         d.dealer_id.clone(),
                    dealer_name:       d.dealer_name.clone(),
                    region:            d.region.clone(),
                    tier:              d.tier,
                    health_score:      h.health_score,
                    health_bucket:     h.health_bucket,
                    churn_probability: c.churn_probability,
                    risk_bucket:       c.risk_bucket,
                })
            })
            .collect();

        let mean = |values: Vec<f64>| -> Option<f64> {
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };
        let avg_health_score = mean(scored.iter().map(|a| a.health_score).collect());
        let avg_churn_probability = mean(scored.iter().map(|a| a.churn_probability).collect());
        let high_churn_accounts = scored.iter().filter(|a| a.risk_bucket == RiskBucket::High).count();
        let scored_accounts = scored.len();

        scored.sort_by(|a, b| {
            b.churn_probability
                .total_cmp(&a.churn_probability)
                .then_with(|| a.dealer_id.cmp(&b.dealer_id))
        });
        scored.truncate(top_n);

        Self {
            accounts: dealers.len(),
            scored_accounts,
            avg_health_score,
            avg_churn_probability,
            high_churn_accounts,
            top_risk: scored,
        }
    }
}

// ── Account profile ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub date:       NaiveDate,
    pub units_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub dealer_id:          DealerId,
    pub dealer:             Option<Dealer>,
    pub health:             Option<DealerHealth>,
    pub churn:              Option<DealerChurn>,
    /// `None` when the dealer left no feedback.
    pub avg_sentiment:      Option<f64>,
    /// Units per sales date, all models summed, oldest first.
    pub sales_series:       Vec<SalesPoint>,
    /// Newest first, at most [`RECENT_TOUCHPOINTS`].
    pub recent_touchpoints: Vec<EngagementEvent>,
    /// Newest first.
    pub warranty_claims:    Vec<WarrantyClaim>,
}

impl AccountProfile {
    /// `None` when the dealer is neither in the master table nor scored.
    pub fn build(dealer_id: &str, tables: &SourceTables, output: &PipelineOutput) -> Option<Self> {
        let dealer = tables.dealers.iter().find(|d| d.dealer_id == dealer_id).cloned();
        let health = output.health.iter().find(|h| h.dealer_id == dealer_id).cloned();
        if dealer.is_none() && health.is_none() {
            return None;
        }

        let churn = output.churn.iter().find(|c| c.dealer_id == dealer_id).cloned();
        let avg_sentiment = output
            .sentiment
            .iter()
            .find(|s| s.dealer_id == dealer_id)
            .map(|s| s.avg_sentiment_score);

        let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for row in tables.sales.iter().filter(|r| r.dealer_id == dealer_id) {
            *by_date.entry(row.date).or_default() += u64::from(row.units_sold);
        }
        let sales_series = by_date
            .into_iter()
            .map(|(date, units_sold)| SalesPoint { date, units_sold })
            .collect();

        let mut recent_touchpoints: Vec<EngagementEvent> = tables
            .engagement
            .iter()
            .filter(|e| e.dealer_id == dealer_id)
            .cloned()
            .collect();
        recent_touchpoints.sort_by(|a, b| b.date.cmp(&a.date));
        recent_touchpoints.truncate(RECENT_TOUCHPOINTS);

        let mut warranty_claims: Vec<WarrantyClaim> = tables
            .claims
            .iter()
            .filter(|c| c.dealer_id == dealer_id)
            .cloned()
            .collect();
        warranty_claims.sort_by(|a, b| b.filed_date.cmp(&a.filed_date));

        Some(Self {
            dealer_id: dealer_id.to_string(),
            dealer,
            health,
            churn,
            avg_sentiment,
            sales_series,
            recent_touchpoints,
            warranty_claims,
        })
    }
}
