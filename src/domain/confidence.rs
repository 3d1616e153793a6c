//! Confidence band around the adjusted probability.

use serde::{Deserialize, Serialize};

/// z-score for a two-sided 95% band.
pub const Z_95: f64 = 1.96;

/// Half-width used when the classifier exposes no ensemble.
pub const FALLBACK_HALF_WIDTH: f64 = 0.1;

/// Closed interval `[lower, upper]` within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    #[must_use]
    pub fn contains(&self, p: f64) -> bool {
        self.lower <= p && p <= self.upper
    }
}

/// Population standard deviation (ddof = 0).
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

pub struct ConfidenceEstimator;

impl ConfidenceEstimator {
    /// Band of `±1.96σ` over the ensemble's per-estimator probabilities, or
    /// a fixed `±0.1` when there is no (non-empty) ensemble.
    #[must_use]
    pub fn estimate(
        adjusted_probability: f64,
        estimator_probabilities: Option<&[f64]>,
    ) -> ConfidenceInterval {
        let half_width = match estimator_probabilities {
            Some(probs) if !probs.is_empty() => Z_95 * std_dev(probs),
            _ => FALLBACK_HALF_WIDTH,
        };
        ConfidenceInterval {
            lower: (adjusted_probability - half_width).max(0.0),
            upper: (adjusted_probability + half_width).min(1.0),
        }
    }
}
