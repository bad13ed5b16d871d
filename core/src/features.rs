//! Feature aggregators. Each reduces one raw table to one row per dealer.
//!
//! Aggregators only see their own table. A dealer missing from a table
//! simply has no row here; the health scorer fills the gap with the
//! neutral default for that signal.
//!
//! Rows come out sorted by dealer_id.

use crate::{
    calendar::Month,
    records::{EngagementEvent, InventoryRecord, SalesRecord, WarrantyClaim},
    types::DealerId,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTrend {
    pub dealer_id:    DealerId,
    pub latest_month: Month,
    /// Growth of the trailing window over the window before it.
    /// `None` when history is too short or the prior window sold nothing.
    pub sales_trend:  Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSeverity {
    pub dealer_id:          DealerId,
    pub avg_claim_severity: f64,
    pub claim_frequency:    usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementIntensity {
    pub dealer_id:          DealerId,
    pub recent_engagements: usize,
    pub avg_duration_mins:  f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRisk {
    pub dealer_id:       DealerId,
    pub avg_stock_units: f64,
    pub avg_ageing_days: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct RunningMean {
    sum:   f64,
    count: usize,
}

impl RunningMean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }
}

// ── Sales trend ──────────────────────────────────────────────────────────────

/// Units sold per dealer per calendar month, chronologically ordered.
pub fn monthly_units_by_dealer(sales: &[SalesRecord]) -> BTreeMap<DealerId, BTreeMap<Month, u64>> {
    let mut monthly: BTreeMap<DealerId, BTreeMap<Month, u64>> = BTreeMap::new();
    for row in sales {
        *monthly
            .entry(row.dealer_id.clone())
            .or_default()
            .entry(Month::of(row.date))
            .or_default() += u64::from(row.units_sold);
    }
    monthly
}

/// Compare the trailing `window`-month sum at the latest observed month
/// with the same sum `window` rows earlier.
///
/// Windows run over observed months in order; a month with no sales rows
/// is not a zero row.
pub fn sales_trend(sales: &[SalesRecord], window: usize) -> Vec<SalesTrend> {
    let window = window.max(1);

    let trends: Vec<SalesTrend> = monthly_units_by_dealer(sales)
        .into_iter()
        .filter_map(|(dealer_id, months)| {
            let latest_month = *months.keys().next_back()?;
            let units: Vec<f64> = months.values().map(|u| *u as f64).collect();
            Some(SalesTrend {
                dealer_id,
                latest_month,
                sales_trend: trailing_growth(&units, window),
            })
        })
        .collect();

    log::debug!(
        "features: sales trend for {} dealers ({} with a defined trend)",
        trends.len(),
        trends.iter().filter(|t| t.sales_trend.is_some()).count(),
    );
    trends
}

fn trailing_growth(units: &[f64], window: usize) -> Option<f64> {
    let rolling_at = |end: usize| -> Option<f64> {
        (end + 1 >= window).then(|| units[end + 1 - window..=end].iter().sum())
    };

    let last = units.len().checked_sub(1)?;
    let current = rolling_at(last)?;
    let previous = rolling_at(last.checked_sub(window)?)?;

    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous)
}

// ── Claim severity ───────────────────────────────────────────────────────────

pub fn claim_severity(claims: &[WarrantyClaim]) -> Vec<ClaimSeverity> {
    let mut by_dealer: BTreeMap<&str, RunningMean> = BTreeMap::new();
    for claim in claims {
        by_dealer
            .entry(claim.dealer_id.as_str())
            .or_default()
            .push(f64::from(claim.severity));
    }

    by_dealer
        .into_iter()
        .map(|(dealer_id, severity)| ClaimSeverity {
            dealer_id:          dealer_id.to_string(),
            avg_claim_severity: severity.mean(),
            claim_frequency:    severity.count,
        })
        .collect()
}

// ── Engagement intensity ─────────────────────────────────────────────────────

/// Earliest date still inside the window. One cutoff for the whole
/// data set, anchored on its latest event; `None` for an empty table.
/// A window reaching past the earliest representable date keeps every event.
pub fn engagement_cutoff(events: &[EngagementEvent], window_days: i64) -> Option<NaiveDate> {
    let latest = events.iter().map(|e| e.date).max()?;
    let cutoff = Duration::try_days(window_days)
        .and_then(|window| latest.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN);
    Some(cutoff)
}

pub fn engagement_intensity(events: &[EngagementEvent], window_days: i64) -> Vec<EngagementIntensity> {
    let Some(cutoff) = engagement_cutoff(events, window_days) else {
        return Vec::new();
    };

    let mut by_dealer: BTreeMap<&str, RunningMean> = BTreeMap::new();
    for event in events.iter().filter(|e| e.date >= cutoff) {
        by_dealer
            .entry(event.dealer_id.as_str())
            .or_default()
            .push(f64::from(event.duration_mins));
    }

    log::debug!(
        "features: {} dealers engaged since {cutoff}",
        by_dealer.len(),
    );

    by_dealer
        .into_iter()
        .map(|(dealer_id, duration)| EngagementIntensity {
            dealer_id:          dealer_id.to_string(),
            recent_engagements: duration.count,
            avg_duration_mins:  duration.mean(),
        })
        .collect()
}

// ── Inventory risk ───────────────────────────────────────────────────────────

pub fn inventory_risk(inventory: &[InventoryRecord]) -> Vec<InventoryRisk> {
    let mut by_dealer: BTreeMap<&str, (RunningMean, RunningMean)> = BTreeMap::new();
    for row in inventory {
        let (stock, ageing) = by_dealer.entry(row.dealer_id.as_str()).or_default();
        stock.push(f64::from(row.stock_units));
        ageing.push(f64::from(row.ageing_days));
    }

    by_dealer
        .into_iter()
        .map(|(dealer_id, (stock, ageing))| InventoryRisk {
            dealer_id:       dealer_id.to_string(),
            avg_stock_units: stock.mean(),
            avg_ageing_days: ageing.mean(),
        })
        .collect()
}
