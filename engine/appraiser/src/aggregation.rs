//! # Unit Price Aggregation
//!
//! Collapses the unit-price observations of one item into a single value,
//! preferring small ("retail") trades over bulk lots.

use crate::config::SolverParameters;
use crate::models::UnitObservation;

/// Nearest-rank quantile: the element at `round(q * (n - 1))` of the sorted values.
///
/// No interpolation, so the result is always one of the inputs. Halves round
/// away from zero and `q` is clamped to `[0, 1]`. Returns `None` for an empty slice.
pub fn nearest_rank(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[rank_index(sorted.len(), q)])
}

fn rank_index(len: usize, q: f64) -> usize {
    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
    let idx = (q * (len - 1) as f64).round() as usize;
    idx.min(len - 1)
}

/// Retail-preferring quantile aggregator
#[derive(Debug, Clone)]
pub struct Aggregator {
    retail_count_max: i64,
    quantile: f64,
}

impl Aggregator {
    pub fn new(retail_count_max: i64, quantile: f64) -> Self {
        Self { retail_count_max: retail_count_max.max(0), quantile }
    }

    pub fn from_parameters(params: &SolverParameters) -> Self {
        Self::new(params.retail_count_max(), params.agg_quantile())
    }

    /// Aggregate observations into one value, or `None` if there are none
    pub fn aggregate(&self, observations: &[UnitObservation]) -> Option<f64> {
        let retail: Vec<f64> = observations
            .iter()
            .filter(|obs| obs.subject_count <= self.retail_count_max)
            .map(|obs| obs.unit_cost)
            .collect();

        let pool = if retail.is_empty() {
            observations.iter().map(|obs| obs.unit_cost).collect()
        } else {
            retail
        };

        nearest_rank(&pool, self.quantile)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::from_parameters(&SolverParameters::default())
    }
}
