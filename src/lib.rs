//! # CardioRisk
//!
//! Explainable cardiovascular risk estimation from self-reported health
//! attributes.
//!
//! A pre-trained binary classifier produces a base probability. A
//! rule-based adjustment layer blends it with clinical heuristics, a
//! confidence band is estimated, and the result is explained through
//! named risk factors and ordered recommendations.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Patient records, rule tables, adjustment, explanation
//! - `ports`: Classifier and scaler traits
//! - `adapters`: JSON model artifacts, log sanitization
//! - `application`: The assessment service
//! - `config`: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{AssessmentService, ServiceHealth};
pub use domain::{PatientInput, PatientRecord, PredictionResult, RiskAssessment, RiskLevel};

/// Result type for CardioRisk operations
pub type Result<T> = std::result::Result<T, CardioRiskError>;

/// Main error type for CardioRisk
#[derive(Debug, thiserror::Error)]
pub enum CardioRiskError {
    #[error("Invalid patient data: {0}")]
    Validation(#[from] domain::ValidationErrors),

    #[error("Feature encoding failed: {0}")]
    Encoding(#[from] domain::EncodingError),

    #[error("Model inference failed: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Model artifacts unavailable: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
