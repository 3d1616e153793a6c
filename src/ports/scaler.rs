//! Scaler port: Trait for the fitted feature normalizer.

use super::ModelError;

/// Normalizes the numeric subset of a feature vector.
pub trait Scaler: Send + Sync {
    /// Transform one sub-vector (in the catalog's scaler-feature order).
    ///
    /// # Errors
    /// Returns `ModelError::DimensionMismatch` on a length mismatch.
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError>;
}
