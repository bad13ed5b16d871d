//! Seeded demo data set with the shape of a real dealer network.
//!
//! RULE: one seed, one data set. Each table draws from its own
//! [`TableRng`] stream so the tables are reproducible independently.
//!
//! The generator only builds [`SourceTables`]; writing them to disk goes
//! through the loader like every other file access.

use crate::{
    calendar::Month,
    error::PipelineResult,
    loader::SourceTables,
    records::{Dealer, DealerTier, EngagementEvent, FeedbackEntry, InventoryRecord, SalesRecord, WarrantyClaim},
    rng::{TableRng, TableSlot},
};
use anyhow::anyhow;
use chrono::{Duration, NaiveDate};

const REGIONS: &[&str] = &["North", "South", "East", "West", "Central"];
const STATES: &[&str] = &["Delhi", "Maharashtra", "Karnataka", "Gujarat", "Tamil Nadu", "Uttar Pradesh"];
const CITIES: &[&str] = &["Delhi", "Mumbai", "Bengaluru", "Ahmedabad", "Chennai", "Lucknow", "Pune", "Jaipur"];
const TIERS: &[DealerTier] = &[DealerTier::T1, DealerTier::T2, DealerTier::T3];
const OWNERSHIP: &[&str] = &["Franchise", "Company Owned", "Partner"];

/// Model line-up with its base monthly volume at a T2 dealer.
const MODELS: &[(&str, f64)] = &[
    ("Hatch-A", 30.0),
    ("Sedan-Z", 20.0),
    ("SUV-X", 15.0),
    ("MPV-Y", 10.0),
    ("EV-E1", 5.0),
];

const ISSUE_TYPES: &[&str] = &["Engine", "AC", "Brakes", "Electrical", "Body", "Other"];
const INTERACTION_TYPES: &[&str] = &["Call", "Dealer Visit", "Video Call", "Email", "Review Meeting"];
const CRM_NOTES: &[&str] = &[
    "Discussed sales performance and incentives.",
    "Reviewed service quality and customer feedback.",
    "Talked about EV potential in the region.",
    "Aligned on quarterly targets and marketing support.",
    "Addressed complaints related to warranty delays.",
];
const FEEDBACK_SOURCES: &[&str] = &["Annual Review", "Survey", "Ad-hoc Call", "Review Meeting"];
const POSITIVE_COMMENTS: &[&str] = &[
    "Inventory allocation is good.",
    "Satisfied with marketing support.",
    "Product quality is appreciated.",
    "Timely delivery of vehicles.",
];
const NEGATIVE_COMMENTS: &[&str] = &[
    "Warranty delays affecting trust.",
    "Marketing support is insufficient.",
    "Training for staff is needed.",
    "More EV models required.",
    "Price discounting pressure in region.",
];

/// Shape of the generated data set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockDataConfig {
    pub dealers:           usize,
    pub first_month:       Month,
    pub months:            u32,
    pub claim_rate:        f64,
    pub positive_feedback: f64,
}

impl MockDataConfig {
    /// Fifty dealers, calendar year 2024.
    pub fn demo() -> Self {
        Self {
            dealers:           50,
            first_month:       Month::january(2024),
            months:            12,
            claim_rate:        0.03,
            positive_feedback: 0.6,
        }
    }

    pub fn with_dealers(mut self, dealers: usize) -> Self {
        self.dealers = dealers;
        self
    }
}

impl Default for MockDataConfig {
    fn default() -> Self {
        Self::demo()
    }
}

fn tier_factor(tier: DealerTier) -> f64 {
    match tier {
        DealerTier::T1 => 1.3,
        DealerTier::T2 => 1.0,
        DealerTier::T3 => 0.7,
    }
}

fn first_day(month: Month) -> PipelineResult<NaiveDate> {
    NaiveDate::from_ymd_opt(month.year(), month.month(), 1)
        .ok_or_else(|| anyhow!("no first day for month {month}").into())
}

/// Truncated normal draw, floored at zero.
fn non_negative(rng: &mut TableRng, mean: f64, std_dev: f64) -> u32 {
    rng.normal(mean, std_dev).trunc().max(0.0) as u32
}

// ── Tables ───────────────────────────────────────────────────────────────────

fn dealers(config: &MockDataConfig, seed: u64) -> Vec<Dealer> {
    let mut rng = TableRng::for_slot(seed, TableSlot::Dealers);
    (1..=config.dealers)
        .map(|i| {
            let dealer_id = format!("D{i:03}");
            Dealer {
                dealer_name:     Some(format!("Dealer_{dealer_id}")),
                region:          rng.choose(REGIONS).to_string(),
                state:           rng.choose(STATES).to_string(),
                city:            rng.choose(CITIES).to_string(),
                tier:            *rng.choose(TIERS),
                years_partnered: rng.range_inclusive(1, 14) as u32,
                ownership_type:  rng.choose(OWNERSHIP).to_string(),
                dealer_id,
            }
        })
        .collect()
}

/// Month-major, then dealer, then model. Zero-unit rows are not written.
fn sales(config: &MockDataConfig, dealers: &[Dealer], seed: u64) -> PipelineResult<Vec<SalesRecord>> {
    let mut rng = TableRng::for_slot(seed, TableSlot::Sales);
    let mut rows = Vec::new();

    for offset in 0..config.months {
        let date = first_day(config.first_month.plus(offset))?;
        for dealer in dealers {
            for &(model, base) in MODELS {
                let units = non_negative(&mut rng, base * tier_factor(dealer.tier), 5.0);
                if units == 0 {
                    continue;
                }
                let unit_value = rng.range_inclusive(500_000, 1_199_999) as f64 / 10.0;
                rows.push(SalesRecord {
                    date,
                    dealer_id:       dealer.dealer_id.clone(),
                    model:           model.to_string(),
                    units_sold:      units,
                    wholesale_value: (f64::from(units) * unit_value * 100.0).round() / 100.0,
                });
            }
        }
    }
    Ok(rows)
}

fn inventory(dealers: &[Dealer], seed: u64) -> Vec<InventoryRecord> {
    let mut rng = TableRng::for_slot(seed, TableSlot::Inventory);
    dealers
        .iter()
        .flat_map(|d| MODELS.iter().map(move |&(model, _)| (d.dealer_id.clone(), model)))
        .map(|(dealer_id, model)| InventoryRecord {
            dealer_id,
            model:       model.to_string(),
            stock_units: non_negative(&mut rng, 20.0, 8.0),
            ageing_days: non_negative(&mut rng, 30.0, 15.0),
        })
        .collect()
}

/// Claim count is a fixed share of all units sold; each claim hangs off a
/// random sales row and is filed 5–119 days after that sale.
fn claims(config: &MockDataConfig, sales: &[SalesRecord], seed: u64) -> Vec<WarrantyClaim> {
    if sales.is_empty() {
        return Vec::new();
    }
    let mut rng = TableRng::for_slot(seed, TableSlot::Claims);
    let total_units: u64 = sales.iter().map(|r| u64::from(r.units_sold)).sum();
    let n_claims = (total_units as f64 * config.claim_rate) as usize;

    (1..=n_claims)
        .map(|n| {
            let sale = rng.choose(sales);
            let filed_date = sale.date + Duration::days(rng.range_inclusive(5, 119));
            WarrantyClaim {
                dealer_id:       sale.dealer_id.clone(),
                claim_id:        format!("C{n:05}"),
                model:           sale.model.clone(),
                filed_date,
                resolution_days: non_negative(&mut rng, 7.0, 3.0).max(1),
                issue_type:      rng.choose(ISSUE_TYPES).to_string(),
                severity:        rng.range_inclusive(1, 3) as u8,
            }
        })
        .collect()
}

fn engagement(config: &MockDataConfig, dealers: &[Dealer], seed: u64) -> PipelineResult<Vec<EngagementEvent>> {
    let mut rng = TableRng::for_slot(seed, TableSlot::Engagement);
    let start = first_day(config.first_month)?;
    let end = first_day(config.first_month.plus(config.months))?;
    let span_days = (end - start).num_days().max(1) - 1;

    let mut rows = Vec::new();
    for dealer in dealers {
        for _ in 0..rng.range_inclusive(5, 24) {
            rows.push(EngagementEvent {
                dealer_id:        dealer.dealer_id.clone(),
                date:             start + Duration::days(rng.range_inclusive(0, span_days)),
                interaction_type: rng.choose(INTERACTION_TYPES).to_string(),
                notes:            rng.choose(CRM_NOTES).to_string(),
                duration_mins:    rng.range_inclusive(10, 89) as u32,
            });
        }
    }
    Ok(rows)
}

fn feedback(config: &MockDataConfig, dealers: &[Dealer], seed: u64) -> PipelineResult<Vec<FeedbackEntry>> {
    let mut rng = TableRng::for_slot(seed, TableSlot::Feedback);
    let mut rows = Vec::new();

    for dealer in dealers {
        for _ in 0..rng.range_inclusive(1, 4) {
            let month = config.first_month.plus(rng.range_inclusive(0, i64::from(config.months) - 1) as u32);
            let day = rng.range_inclusive(1, 27) as u32;
            let feedback_date = NaiveDate::from_ymd_opt(month.year(), month.month(), day)
                .ok_or_else(|| anyhow!("invalid feedback date {month}-{day:02}"))?;
            let comments = if rng.chance(config.positive_feedback) {
                rng.choose(POSITIVE_COMMENTS)
            } else {
                rng.choose(NEGATIVE_COMMENTS)
            };
            rows.push(FeedbackEntry {
                dealer_id:       dealer.dealer_id.clone(),
                feedback_date,
                feedback_source: rng.choose(FEEDBACK_SOURCES).to_string(),
                comments:        comments.to_string(),
            });
        }
    }
    Ok(rows)
}

// ── Entry point ──────────────────────────────────────────────────────────────

/// Build all six tables from one seed.
pub fn generate(seed: u64, config: &MockDataConfig) -> PipelineResult<SourceTables> {
    let dealers = dealers(config, seed);
    let sales = sales(config, &dealers, seed)?;
    let inventory = inventory(&dealers, seed);
    let claims = claims(config, &sales, seed);
    let engagement = engagement(config, &dealers, seed)?;
    let feedback = feedback(config, &dealers, seed)?;

    log::info!(
        "mock_data: seed {seed} -> {} dealers, {} sales rows, {} claims",
        dealers.len(),
        sales.len(),
        claims.len(),
    );

    Ok(SourceTables { dealers, sales, inventory, claims, engagement, feedback })
}
