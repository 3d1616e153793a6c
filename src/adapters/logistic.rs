//! Logistic-regression classifier from exported coefficients.

use serde::{Deserialize, Serialize};

use crate::ports::{check_features, ModelError, RiskClassifier};

#[derive(Deserialize)]
struct RawLogistic {
    coefficients: Vec<f64>,
    intercept: f64,
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLogistic")]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl TryFrom<RawLogistic> for LogisticRegression {
    type Error = ModelError;

    fn try_from(raw: RawLogistic) -> Result<Self, Self::Error> {
        Self::new(raw.coefficients, raw.intercept)
    }
}

impl LogisticRegression {
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` for empty or non-finite parameters.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, ModelError> {
        if coefficients.is_empty() {
            return Err(ModelError::InvalidArtifact("no coefficients".into()));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidArtifact("non-finite coefficient".into()));
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    fn decision(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_features(features, self.coefficients.len())?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum();
        Ok(dot + self.intercept)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl RiskClassifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<u8, ModelError> {
        Ok(u8::from(self.decision(features)? > 0.0))
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.decision(features).map(sigmoid)
    }

    fn describe(&self) -> String {
        format!("logistic_regression(features={})", self.coefficients.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_probability() {
        let model = LogisticRegression::new(vec![1.0, -1.0], 0.0).expect("valid model");
        let p = model.predict_probability(&[2.0, 2.0]).expect("predict");
        assert!((p - 0.5).abs() < 1e-12);

        let p = model.predict_probability(&[3.0, 1.0]).expect("predict");
        assert!((p - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
        assert_eq!(model.predict(&[3.0, 1.0]).expect("predict"), 1);
        assert_eq!(model.predict(&[1.0, 3.0]).expect("predict"), 0);
    }

    #[test]
    fn test_has_no_ensemble() {
        let model = LogisticRegression::new(vec![0.5], -0.2).expect("valid model");
        assert_eq!(model.estimator_probabilities(&[1.0]).expect("predict"), None);
    }

    #[test]
    fn test_rejects_bad_parameters_and_inputs() {
        assert!(LogisticRegression::new(vec![], 0.0).is_err());
        assert!(LogisticRegression::new(vec![f64::INFINITY], 0.0).is_err());

        let model = LogisticRegression::new(vec![0.5, 0.5], 0.0).expect("valid model");
        assert!(matches!(
            model.predict_probability(&[1.0]),
            Err(ModelError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_deserialize() {
        let model: LogisticRegression =
            serde_json::from_str(r#"{"coefficients": [0.1, 0.2], "intercept": -0.3}"#)
                .expect("parse model");
        assert_eq!(model.n_features(), 2);
    }
}
