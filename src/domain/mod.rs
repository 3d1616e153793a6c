//! Domain layer: Core business types and logic.
//!
//! Pure types and rule tables. Nothing here touches the filesystem or the
//! model artifacts directly; the classifier and scaler come in through ports.

pub mod adjustment;
pub mod assessment;
pub mod confidence;
pub mod encoding;
mod patient;
pub mod recommendations;
pub mod risk_factors;
pub mod rules;

pub use adjustment::{Adjustment, MedicalAdjustmentEngine};
pub use assessment::{PredictionResult, RiskAssessment, RiskLevel, DISCLAIMER};
pub use confidence::{ConfidenceEstimator, ConfidenceInterval};
pub use encoding::{EncodedFeatureVector, EncodingCatalog, EncodingError, FeatureEncoder};
pub use patient::{
    AlcoholIntake, Gender, PatientInput, PatientRecord, Smoking, ValidationError,
    ValidationErrors, YesNo,
};
pub use recommendations::RecommendationGenerator;
pub use risk_factors::{RiskFactor, RiskFactorEntry, RiskFactorExtractor, RiskFactorMap, Severity};
