//! Ports layer: Trait definitions for the trained model artifacts.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the risk pipeline and whatever produced the classifier and scaler.

mod classifier;
mod scaler;

pub(crate) use classifier::check_features;
pub use classifier::{ModelError, RiskClassifier};
pub use scaler::Scaler;
