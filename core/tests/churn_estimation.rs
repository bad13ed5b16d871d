use chrono::NaiveDate;
use kam_core::{
    churn::{churn_probability, estimate_churn, RiskBucket},
    config::PipelineConfig,
    features::ClaimSeverity,
    forecast::ForecastRequest,
    health::{DealerHealth, HealthBucket},
    loader::SourceTables,
    pipeline::ScoringPipeline,
    records::{InventoryRecord, SalesRecord},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn health(dealer: &str, score: f64) -> DealerHealth {
    DealerHealth {
        dealer_id:     dealer.into(),
        health_score:  score,
        health_bucket: HealthBucket::classify(score, &PipelineConfig::standard().health.buckets),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// The severity bump can push the raw sum past 1; the result is clamped.
#[test]
fn probability_is_clamped_to_unit_interval() {
    let config = PipelineConfig::standard().churn;

    assert_eq!(churn_probability(0.0, 3.0, &config), 1.0);
    assert_eq!(churn_probability(100.0, 0.0, &config), 0.0);
    for score in [0.0, 12.5, 50.0, 99.0, 100.0] {
        for severity in [0.0, 1.0, 2.0, 3.0] {
            let p = churn_probability(score, severity, &config);
            assert!((0.0..=1.0).contains(&p), "p={p} for score={score} severity={severity}");
        }
    }
}

#[test]
fn severity_adds_a_bounded_bump() {
    let config = PipelineConfig::standard().churn;
    let p = churn_probability(80.0, 3.0, &config);
    assert!((p - 0.3).abs() < 1e-12, "got {p}");
}

#[test]
fn bucket_edges_are_inclusive_above() {
    let edges = PipelineConfig::standard().churn.buckets;
    assert_eq!(RiskBucket::classify(0.33, &edges), RiskBucket::Low);
    assert_eq!(RiskBucket::classify(0.3301, &edges), RiskBucket::Medium);
    assert_eq!(RiskBucket::classify(0.66, &edges), RiskBucket::Medium);
    assert_eq!(RiskBucket::classify(0.6601, &edges), RiskBucket::High);
}

/// Dealers without claims get no bump; claims outside the health cohort
/// are ignored.
#[test]
fn estimate_follows_health_rows() {
    let config = PipelineConfig::standard().churn;
    let rows = vec![health("D001", 25.0), health("D002", 90.0)];
    let claims = vec![
        ClaimSeverity { dealer_id: "D002".into(), avg_claim_severity: 3.0, claim_frequency: 4 },
        ClaimSeverity { dealer_id: "D999".into(), avg_claim_severity: 1.0, claim_frequency: 1 },
    ];

    let churn = estimate_churn(&rows, &claims, &config);
    assert_eq!(churn.len(), 2);
    assert_eq!(churn[0].dealer_id, "D001");
    assert_eq!(churn[0].churn_probability, 0.75);
    assert_eq!(churn[0].risk_bucket, RiskBucket::High);
    assert!((churn[1].churn_probability - 0.2).abs() < 1e-12);
    assert_eq!(churn[1].risk_bucket, RiskBucket::Low);
}

/// D001 sells 100/110/120 over three months with no claims and no CRM
/// touchpoints. Without claims, churn is exactly the inverse health.
#[test]
fn claim_free_dealer_churn_is_inverse_health() {
    let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
    let sale = |dealer: &str, m, units| SalesRecord {
        date:            d(m),
        dealer_id:       dealer.to_string(),
        model:           "Hatch-A".into(),
        units_sold:      units,
        wholesale_value: 0.0,
    };
    let tables = SourceTables {
        sales: vec![
            sale("D001", 1, 100),
            sale("D001", 2, 110),
            sale("D001", 3, 120),
            sale("D002", 3, 40),
        ],
        inventory: vec![
            InventoryRecord { dealer_id: "D001".into(), model: "Hatch-A".into(), stock_units: 10, ageing_days: 20 },
            InventoryRecord { dealer_id: "D002".into(), model: "Hatch-A".into(), stock_units: 10, ageing_days: 60 },
        ],
        ..SourceTables::default()
    };

    let output = ScoringPipeline::standard().run(&tables, &ForecastRequest::cohort());
    let h = output.health.iter().find(|h| h.dealer_id == "D001").unwrap();
    let c = output.churn.iter().find(|c| c.dealer_id == "D001").unwrap();

    assert_eq!(c.churn_probability, 1.0 - h.health_score / 100.0);
    // Trend, engagement and claims are neutral; D001 has the fresher stock.
    assert!((h.health_score - 60.0).abs() < 1e-9, "got {}", h.health_score);
}
