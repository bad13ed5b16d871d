use chrono::NaiveDate;
use kam_core::{
    calendar::Month,
    config::PipelineConfig,
    features::{ClaimSeverity, EngagementIntensity, InventoryRisk, SalesTrend},
    health::{compute_health_score, join_features, score_cohort, HealthBucket},
    records::{EngagementEvent, InventoryRecord, SalesRecord, WarrantyClaim},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sale(dealer: &str, month: u32, units: u32) -> SalesRecord {
    SalesRecord {
        date:            date(2024, month, 1),
        dealer_id:       dealer.into(),
        model:           "Hatch-A".into(),
        units_sold:      units,
        wholesale_value: 0.0,
    }
}

fn stock(dealer: &str, ageing_days: u32) -> InventoryRecord {
    InventoryRecord { dealer_id: dealer.into(), model: "Hatch-A".into(), stock_units: 12, ageing_days }
}

fn claim(dealer: &str, severity: u8) -> WarrantyClaim {
    WarrantyClaim {
        dealer_id:       dealer.into(),
        claim_id:        format!("C-{dealer}-{severity}"),
        model:           "Hatch-A".into(),
        issue_type:      "Engine".into(),
        severity,
        filed_date:      date(2024, 5, 10),
        resolution_days: 4,
    }
}

fn visit(dealer: &str, d: NaiveDate) -> EngagementEvent {
    EngagementEvent {
        dealer_id:        dealer.into(),
        date:             d,
        interaction_type: "Dealer Visit".into(),
        notes:            "Reviewed targets.".into(),
        duration_mins:    45,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Upper edges are inclusive: 40.0 is still High Risk, 70.0 still Watchlist.
#[test]
fn bucket_edges_are_inclusive_above() {
    let edges = PipelineConfig::standard().health.buckets;

    assert_eq!(HealthBucket::classify(0.0, &edges), HealthBucket::HighRisk);
    assert_eq!(HealthBucket::classify(40.0, &edges), HealthBucket::HighRisk);
    assert_eq!(HealthBucket::classify(40.0001, &edges), HealthBucket::Watchlist);
    assert_eq!(HealthBucket::classify(70.0, &edges), HealthBucket::Watchlist);
    assert_eq!(HealthBucket::classify(70.0001, &edges), HealthBucket::Healthy);
    assert_eq!(HealthBucket::HighRisk.to_string(), "High Risk");
}

/// A dealer seen in any aggregate joins the cohort; the rest is zero-filled.
#[test]
fn outer_join_keeps_every_dealer() {
    let trends = vec![SalesTrend {
        dealer_id:    "D001".into(),
        latest_month: Month::new(2024, 3).unwrap(),
        sales_trend:  None,
    }];
    let claims = vec![ClaimSeverity { dealer_id: "D002".into(), avg_claim_severity: 2.5, claim_frequency: 2 }];
    let engagement = vec![EngagementIntensity {
        dealer_id:          "D003".into(),
        recent_engagements: 4,
        avg_duration_mins:  30.0,
    }];
    let inventory = vec![InventoryRisk { dealer_id: "D001".into(), avg_stock_units: 8.0, avg_ageing_days: 25.0 }];

    let joined = join_features(&trends, &claims, &engagement, &inventory);
    let ids: Vec<&str> = joined.iter().map(|f| f.dealer_id.as_str()).collect();
    assert_eq!(ids, vec!["D001", "D002", "D003"]);

    assert_eq!(joined[0].sales_trend, 0.0, "undefined trend fills with 0");
    assert_eq!(joined[0].avg_ageing_days, 25.0);
    assert_eq!(joined[1].avg_claim_severity, 2.5);
    assert_eq!(joined[1].avg_ageing_days, 0.0);
    assert_eq!(joined[2].recent_engagements, 4.0);
}

/// A single-dealer cohort is degenerate on every signal, so every
/// component sits at the neutral midpoint.
#[test]
fn lone_dealer_scores_at_midpoint() {
    let config = PipelineConfig::standard().health;
    let health = compute_health_score(&[sale("D009", 1, 20)], &[], &[], &[], &config);

    assert_eq!(health.len(), 1);
    assert!((health[0].health_score - 50.0).abs() < 1e-9, "got {}", health[0].health_score);
    assert_eq!(health[0].health_bucket, HealthBucket::Watchlist);
}

/// A dealer only present in sales must still be scored with finite values.
#[test]
fn sales_only_dealer_gets_finite_score() {
    let config = PipelineConfig::standard().health;
    let sales = vec![sale("D001", 1, 10), sale("D001", 2, 12), sale("D077", 1, 5)];
    let inventory = vec![stock("D001", 30)];
    let claims = vec![claim("D001", 3)];
    let events = vec![visit("D001", date(2024, 2, 14))];

    let health = compute_health_score(&sales, &claims, &events, &inventory, &config);
    let d077 = health.iter().find(|h| h.dealer_id == "D077").expect("sales-only dealer scored");

    assert!(d077.health_score.is_finite());
    assert!((0.0..=100.0).contains(&d077.health_score));
}

/// Best on every signal scores 100, worst on every signal scores 0; the
/// linear combination is reported as is.
#[test]
fn scores_stay_within_bounds_at_the_extremes() {
    let config = PipelineConfig::standard().health;

    let mut sales = Vec::new();
    for month in 1..=6 {
        sales.push(sale("BEST", month, if month <= 3 { 10 } else { 30 }));
        sales.push(sale("WORST", month, if month <= 3 { 30 } else { 10 }));
    }
    let claims = vec![claim("WORST", 3), claim("BEST", 1)];
    let events = vec![visit("BEST", date(2024, 6, 20)), visit("BEST", date(2024, 6, 21))];
    let inventory = vec![stock("BEST", 5), stock("WORST", 90)];

    let health = compute_health_score(&sales, &claims, &events, &inventory, &config);
    let best = health.iter().find(|h| h.dealer_id == "BEST").unwrap();
    let worst = health.iter().find(|h| h.dealer_id == "WORST").unwrap();

    assert!((best.health_score - 100.0).abs() < 1e-9, "best={}", best.health_score);
    assert!(worst.health_score.abs() < 1e-9, "worst={}", worst.health_score);
    assert_eq!(best.health_bucket, HealthBucket::Healthy);
    assert_eq!(worst.health_bucket, HealthBucket::HighRisk);
}

/// Scoring emits one row per joined row, in dealer order.
#[test]
fn score_cohort_preserves_join_order() {
    let config = PipelineConfig::standard().health;
    let inventory = vec![stock("D003", 10), stock("D001", 50), stock("D002", 30)];
    let cohort = join_features(&[], &[], &[], &kam_core::features::inventory_risk(&inventory));

    let health = score_cohort(&cohort, &config);
    let ids: Vec<&str> = health.iter().map(|h| h.dealer_id.as_str()).collect();
    assert_eq!(ids, vec!["D001", "D002", "D003"]);
    assert!(health[2].health_score > health[0].health_score, "fresher stock scores higher");
}
