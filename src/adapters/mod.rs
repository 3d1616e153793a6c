//! Adapters layer: Concrete implementations of ports.
//!
//! - `forest`, `logistic`: classifiers evaluated from exported JSON
//! - `scaler`: the fitted standard scaler
//! - `artifacts`: loads and verifies the model directory
//! - `sanitize`: patient-attribute filtering for logs

pub mod artifacts;
pub mod forest;
pub mod logistic;
pub mod sanitize;
pub mod scaler;

pub use artifacts::{write_manifest, ArtifactError, ClassifierModel, ModelArtifacts};
pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use scaler::StandardScaler;
