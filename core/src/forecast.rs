//! Short-horizon demand forecast per dealer and model.
//!
//! A flat extrapolation: the mean of the most recent observed months is
//! projected unchanged over the horizon. No seasonality, no error bars.
//! Pairs with less history than `minimum_history_months` are skipped.

use crate::{
    calendar::Month,
    config::ForecastConfig,
    records::SalesRecord,
    types::{DealerId, ModelName},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub dealer_id:      DealerId,
    pub model:          ModelName,
    pub month:          Month,
    pub forecast_units: f64,
}

/// What to forecast. Without a dealer filter the whole cohort is
/// forecast, grouped internally by dealer and model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForecastRequest {
    pub dealer_id:      Option<DealerId>,
    pub horizon_months: Option<u32>,
}

impl ForecastRequest {
    pub fn cohort() -> Self {
        Self::default()
    }

    pub fn for_dealer(dealer_id: impl Into<DealerId>) -> Self {
        Self { dealer_id: Some(dealer_id.into()), horizon_months: None }
    }

    pub fn with_horizon(mut self, months: u32) -> Self {
        self.horizon_months = Some(months);
        self
    }
}

fn monthly_units_by_model(
    sales: &[SalesRecord],
    dealer_id: Option<&str>,
) -> BTreeMap<(DealerId, ModelName), BTreeMap<Month, u64>> {
    let mut series: BTreeMap<(DealerId, ModelName), BTreeMap<Month, u64>> = BTreeMap::new();
    for row in sales {
        if dealer_id.is_some_and(|id| id != row.dealer_id) {
            continue;
        }
        *series
            .entry((row.dealer_id.clone(), row.model.clone()))
            .or_default()
            .entry(Month::of(row.date))
            .or_default() += u64::from(row.units_sold);
    }
    series
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Rows are ordered by dealer, model, then month.
pub fn forecast_demand(
    sales:   &[SalesRecord],
    request: &ForecastRequest,
    config:  &ForecastConfig,
) -> Vec<ForecastRow> {
    let horizon = request.horizon_months.unwrap_or(config.horizon_months);
    let lookback = config.lookback_months.max(1);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for ((dealer_id, model), months) in monthly_units_by_model(sales, request.dealer_id.as_deref()) {
        let Some(latest) = months.keys().next_back().copied() else {
            continue;
        };
        if months.len() < config.minimum_history_months {
            skipped += 1;
            continue;
        }

        let recent: Vec<f64> = months.values().rev().take(lookback).map(|u| *u as f64).collect();
        let mean = recent.iter().sum::<f64>() / recent.len() as f64;
        let forecast_units = round_to(mean, config.round_decimals);

        rows.extend((1..=horizon).map(|step| ForecastRow {
            dealer_id: dealer_id.clone(),
            model: model.clone(),
            month: latest.plus(step),
            forecast_units,
        }));
    }

    if skipped > 0 {
        log::debug!(
            "forecast: skipped {skipped} dealer/model pairs with under {} months of history",
            config.minimum_history_months,
        );
    }
    rows
}
