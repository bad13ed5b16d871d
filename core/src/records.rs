//! Source table rows, the immutable inputs of a pipeline run.
//!
//! Column names match the CSV headers written by the demo data set.
//! No referential integrity is assumed: a claim or CRM event may name a
//! dealer that is absent from the master table.

use crate::types::{ClaimId, DealerId, ModelName};
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DealerTier {
    T1,
    T2,
    T3,
}

impl DealerTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::T1 => "T1",
            Self::T2 => "T2",
            Self::T3 => "T3",
        }
    }
}

impl fmt::Display for DealerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dealer {
    pub dealer_id:       DealerId,
    #[serde(default)]
    pub dealer_name:     Option<String>,
    pub region:          String,
    pub state:           String,
    pub city:            String,
    pub tier:            DealerTier,
    pub years_partnered: u32,
    pub ownership_type:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date:            NaiveDate,
    pub dealer_id:       DealerId,
    pub model:           ModelName,
    pub units_sold:      u32,
    pub wholesale_value: f64,
}

/// Point-in-time stock position; the table carries no date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub dealer_id:   DealerId,
    pub model:       ModelName,
    pub stock_units: u32,
    pub ageing_days: u32,
}

/// Severity is ordinal: 1 = minor, 3 = worst. Other levels fail the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantyClaim {
    pub dealer_id:       DealerId,
    pub claim_id:        ClaimId,
    pub model:           ModelName,
    pub issue_type:      String,
    #[serde(deserialize_with = "severity_level")]
    pub severity:        u8,
    pub filed_date:      NaiveDate,
    pub resolution_days: u32,
}

/// Highest claim severity level.
pub const MAX_CLAIM_SEVERITY: u8 = 3;

fn severity_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let level = u8::deserialize(deserializer)?;
    if (1..=MAX_CLAIM_SEVERITY).contains(&level) {
        Ok(level)
    } else {
        Err(de::Error::custom(format!(
            "severity must be in 1..={MAX_CLAIM_SEVERITY}, got {level}"
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub dealer_id:        DealerId,
    pub date:             NaiveDate,
    pub interaction_type: String,
    #[serde(default)]
    pub notes:            String,
    pub duration_mins:    u32,
}

/// A free-text feedback form. Sentiment is derived by the pipeline, see
/// [`crate::sentiment::ScoredFeedback`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub dealer_id:       DealerId,
    pub feedback_date:   NaiveDate,
    pub feedback_source: String,
    #[serde(default)]
    pub comments:        String,
}
