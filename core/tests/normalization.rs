use kam_core::normalize::{normalize, normalize_values, FeatureRange, NEUTRAL};

// ── Tests ────────────────────────────────────────────────────────────────────

/// Empty in, empty out.
#[test]
fn empty_column_stays_empty() {
    assert!(normalize(&[]).is_empty());
    assert!(normalize_values(&[]).is_empty());
}

/// The minimum maps to exactly 0.0, the maximum to exactly 1.0, and every
/// other value lands inside the interval.
#[test]
fn spread_column_spans_unit_interval() {
    let scaled = normalize_values(&[4.0, -2.0, 10.0, 7.0]);

    assert_eq!(scaled[1], 0.0, "min must map to 0.0");
    assert_eq!(scaled[2], 1.0, "max must map to 1.0");
    assert!((scaled[0] - 0.5).abs() < 1e-12, "got {}", scaled[0]);
    assert!((scaled[3] - 0.75).abs() < 1e-12, "got {}", scaled[3]);
    for v in &scaled {
        assert!((0.0..=1.0).contains(v), "value {v} outside [0,1]");
    }
}

/// No variance, including the all-zero column, means neutral everywhere.
#[test]
fn constant_column_is_neutral() {
    assert_eq!(normalize_values(&[3.0; 5]), vec![0.5; 5]);
    assert_eq!(normalize_values(&[0.0, 0.0, 0.0]), vec![0.5; 3]);
    assert_eq!(normalize_values(&[42.0]), vec![0.5]);
}

/// A column with no present value is neutral; a partly absent column
/// scales the present values and leaves the gaps neutral.
#[test]
fn absent_values_are_neutral() {
    assert_eq!(normalize(&[None, None]), vec![NEUTRAL; 2]);

    let scaled = normalize(&[Some(1.0), None, Some(3.0)]);
    assert_eq!(scaled, vec![0.0, NEUTRAL, 1.0]);
}

/// Non-finite values do not widen the observed range.
#[test]
fn non_finite_values_are_ignored_when_observing() {
    let range = FeatureRange::observe([Some(1.0), Some(f64::NAN), Some(5.0), Some(f64::INFINITY)])
        .expect("finite values present");

    assert_eq!(range, FeatureRange { min: 1.0, max: 5.0 });
    assert_eq!(range.scale(Some(f64::NAN)), NEUTRAL);
    assert_eq!(range.scale(Some(3.0)), 0.5);
}

/// Scaling is relative to the cohort: the same raw value lands in
/// different places in different batches.
#[test]
fn scaling_is_cohort_relative() {
    let small = normalize_values(&[0.0, 10.0, 20.0]);
    let large = normalize_values(&[0.0, 10.0, 100.0]);
    assert!(small[1] > large[1], "10 should rank higher in the smaller cohort");
}
