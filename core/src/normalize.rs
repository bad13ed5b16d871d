//! Cohort-relative min-max scaling.
//!
//! Normalization is always relative to the batch being scored: the same
//! raw value can map to different positions in different cohorts.
//! Degenerate inputs map to the neutral midpoint instead of 0 or 1 so a
//! feature nobody varies on cannot push a score either way.

/// Value assigned when a feature carries no ranking information.
pub const NEUTRAL: f64 = 0.5;

/// Observed bounds of one feature across a cohort.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    /// Bounds over the present, finite values. `None` when there are none.
    pub fn observe<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |range: Option<Self>, v| {
                Some(match range {
                    Some(r) => Self { min: r.min.min(v), max: r.max.max(v) },
                    None    => Self { min: v, max: v },
                })
            })
    }

    /// No variance to rank on.
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    /// Position of `value` inside the range. Absent values and degenerate
    /// ranges yield [`NEUTRAL`].
    pub fn scale(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) if v.is_finite() && !self.is_degenerate() => {
                (v - self.min) / (self.max - self.min)
            }
            _ => NEUTRAL,
        }
    }
}

/// Min-max scale a feature column into [0, 1], one output per input.
///
/// - empty input → empty output
/// - every value absent → 0.5 everywhere
/// - max == min → 0.5 everywhere
/// - otherwise `(v - min) / (max - min)`; absent entries → 0.5
pub fn normalize(values: &[Option<f64>]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    match FeatureRange::observe(values.iter().copied()) {
        Some(range) => values.iter().map(|v| range.scale(*v)).collect(),
        None => vec![NEUTRAL; values.len()],
    }
}

/// [`normalize`] for a fully populated column.
pub fn normalize_values(values: &[f64]) -> Vec<f64> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    normalize(&wrapped)
}
