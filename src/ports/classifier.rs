//! Classifier port: Trait for the pre-trained binary risk classifier.
//!
//! Implementations are loaded once at startup and shared read-only across
//! requests, hence the `Send + Sync` bound.

/// Errors raised by model artifacts at prediction time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Feature count mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Model produced an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("Model received a non-finite feature at index {0}")]
    NonFiniteFeature(usize),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
}

/// Trait for a trained binary classifier.
pub trait RiskClassifier: Send + Sync {
    /// Number of features the classifier was trained on.
    fn n_features(&self) -> usize;

    /// Predicted class (0 = no disease, 1 = disease).
    ///
    /// # Errors
    /// Returns `ModelError` if the vector does not fit the model.
    fn predict(&self, features: &[f64]) -> Result<u8, ModelError>;

    /// Probability of the positive class, in `[0, 1]`.
    ///
    /// # Errors
    /// Returns `ModelError` if the vector does not fit the model.
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Positive-class probability from each sub-estimator of an ensemble.
    ///
    /// Single models return `Ok(None)`.
    ///
    /// # Errors
    /// Returns `ModelError` if the vector does not fit the model.
    fn estimator_probabilities(&self, _features: &[f64]) -> Result<Option<Vec<f64>>, ModelError> {
        Ok(None)
    }

    /// Short model description for logs and health output.
    fn describe(&self) -> String;
}

/// Shared input checks for classifier implementations.
pub(crate) fn check_features(features: &[f64], expected: usize) -> Result<(), ModelError> {
    if features.len() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            got: features.len(),
        });
    }
    match features.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ModelError::NonFiniteFeature(i)),
        None => Ok(()),
    }
}
