//! Assessment service: Orchestrates the risk pipeline for one record.
//!
//! This service coordinates:
//! - Feature encoding and scaling
//! - Classifier inference
//! - Medical adjustment of the base probability
//! - Confidence band estimation
//! - Risk factor and recommendation synthesis

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::adapters::{ClassifierModel, ModelArtifacts, StandardScaler};
use crate::domain::{
    ConfidenceEstimator, EncodingCatalog, FeatureEncoder, MedicalAdjustmentEngine, PatientInput,
    PatientRecord, PredictionResult, RecommendationGenerator, RiskAssessment,
    RiskFactorExtractor,
};
use crate::ports::{ModelError, RiskClassifier, Scaler};
use crate::CardioRiskError;

/// Liveness report for the loaded pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    pub models_loaded: bool,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Service for running risk assessments.
///
/// Holds only immutable, shared state, so one instance can serve any
/// number of concurrent requests.
pub struct AssessmentService<C, S>
where
    C: RiskClassifier,
    S: Scaler,
{
    classifier: Arc<C>,
    scaler: Arc<S>,
    catalog: Arc<EncodingCatalog>,
    engine: MedicalAdjustmentEngine,
}

impl AssessmentService<ClassifierModel, StandardScaler> {
    /// Build the service from a loaded model directory.
    #[must_use]
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        Self::new(
            Arc::new(artifacts.classifier),
            Arc::new(artifacts.scaler),
            Arc::new(artifacts.catalog),
        )
    }
}

impl<C, S> AssessmentService<C, S>
where
    C: RiskClassifier,
    S: Scaler,
{
    pub fn new(classifier: Arc<C>, scaler: Arc<S>, catalog: Arc<EncodingCatalog>) -> Self {
        Self {
            classifier,
            scaler,
            catalog,
            engine: MedicalAdjustmentEngine::new(),
        }
    }

    /// Run the numeric pipeline: encode, classify, adjust, estimate the band.
    ///
    /// # Errors
    /// Returns error if encoding fails or the classifier rejects the vector
    /// or produces a probability outside `[0, 1]`.
    pub fn predict(&self, record: &PatientRecord) -> Result<PredictionResult, CardioRiskError> {
        tracing::debug!("Step 1: Encoding features...");
        let encoded = FeatureEncoder::encode(record, &self.catalog, self.scaler.as_ref())?;

        tracing::debug!("Step 2: Running classifier...");
        let base_probability = self.classifier.predict_probability(encoded.as_slice())?;
        check_probability(base_probability)?;

        tracing::debug!("Step 3: Applying medical adjustment...");
        let adjusted_probability = self.engine.adjust(record, base_probability);

        tracing::debug!("Step 4: Estimating confidence interval...");
        let estimators = self
            .classifier
            .estimator_probabilities(encoded.as_slice())?;
        if let Some(probs) = &estimators {
            probs.iter().try_for_each(|&p| check_probability(p))?;
        }
        let interval = ConfidenceEstimator::estimate(adjusted_probability, estimators.as_deref());

        tracing::debug!(
            base_probability,
            adjusted_probability,
            lower = interval.lower,
            upper = interval.upper,
            "Prediction complete"
        );
        Ok(PredictionResult::new(adjusted_probability, interval))
    }

    /// Full explainable assessment for a validated record.
    ///
    /// # Errors
    /// Returns error if the numeric pipeline fails; no partial result is
    /// produced.
    pub fn assess(&self, record: &PatientRecord) -> Result<RiskAssessment, CardioRiskError> {
        let prediction = self.predict(record)?;
        let factors = RiskFactorExtractor::extract(record);
        let recommendations =
            RecommendationGenerator::generate(prediction.adjusted_probability, &factors);
        let assessment = RiskAssessment::new(&prediction, factors, recommendations);

        let combinations = assessment
            .risk_factors
            .iter()
            .filter(|e| e.factor.is_combination())
            .count();
        tracing::info!(
            risk = %assessment.risk_level,
            probability = assessment.risk_probability,
            factors = assessment.risk_factors.len(),
            combinations,
            recommendations = assessment.recommendations.len(),
            "Assessment complete"
        );
        Ok(assessment)
    }

    /// Validate a raw request, then assess it.
    ///
    /// # Errors
    /// Returns `CardioRiskError::Validation` listing every rejected field, or
    /// any error from [`Self::assess`].
    pub fn assess_input(&self, input: &PatientInput) -> Result<RiskAssessment, CardioRiskError> {
        let record = input.validate()?;
        self.assess(&record)
    }

    #[must_use]
    pub fn health(&self) -> ServiceHealth {
        ServiceHealth {
            status: "healthy",
            models_loaded: true,
            model: self.classifier.describe(),
            timestamp: Utc::now(),
        }
    }
}

fn check_probability(p: f64) -> Result<(), ModelError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ModelError::InvalidProbability(p))
    }
}
