//! Assessment result types.
//!
//! Represents the output of the risk pipeline: the raw prediction, its tier
//! and the full explainable response returned to callers.

use serde::{Deserialize, Serialize};

use crate::domain::confidence::ConfidenceInterval;
use crate::domain::risk_factors::RiskFactorMap;

/// Shown with every assessment.
pub const DISCLAIMER: &str =
    "This prediction is for guidance only and does not replace a professional medical consultation.";

/// Probability at or above which the risk is High.
pub const HIGH_RISK_THRESHOLD: f64 = 0.6;

/// Probability at or above which the risk is at least Moderate.
pub const MODERATE_RISK_THRESHOLD: f64 = 0.35;

/// Probability at or above which the final label is positive.
pub const POSITIVE_LABEL_THRESHOLD: f64 = 0.5;

/// Risk level classification for cardiovascular disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk of cardiovascular disease
    Low,
    /// Moderate risk, follow-up recommended
    Moderate,
    /// High risk, specialist consultation advised
    High,
}

impl RiskLevel {
    /// Tier of an adjusted probability: `[0, 0.35)`, `[0.35, 0.6)`, `[0.6, 1]`.
    #[must_use]
    pub fn from_probability(p: f64) -> Self {
        if p >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if p >= MODERATE_RISK_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Label text reported to callers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Result of the pipeline before it is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Binary label derived from the adjusted probability (1 = at risk)
    pub final_label: u8,

    /// Adjusted probability (0.01 to 0.99)
    pub adjusted_probability: f64,

    /// Band with `lower <= adjusted_probability <= upper`
    pub confidence_interval: ConfidenceInterval,
}

impl PredictionResult {
    #[must_use]
    pub fn new(adjusted_probability: f64, confidence_interval: ConfidenceInterval) -> Self {
        let final_label = u8::from(adjusted_probability >= POSITIVE_LABEL_THRESHOLD);
        Self {
            final_label,
            adjusted_probability,
            confidence_interval,
        }
    }

    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_probability(self.adjusted_probability)
    }
}

/// Round half away from zero to three decimals.
#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Complete response for one patient record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Tier label ("Low Risk", "Moderate Risk", "High Risk")
    pub risk_prediction: &'static str,

    /// Adjusted probability rounded to three decimals
    pub risk_probability: f64,

    /// `[lower, upper]` rounded to three decimals
    pub confidence_interval: [f64; 2],

    /// Factor name -> explanation, in extraction order
    pub risk_factors: RiskFactorMap,

    /// Ordered advice lines
    pub recommendations: Vec<String>,

    pub disclaimer: &'static str,

    #[serde(skip)]
    pub risk_level: RiskLevel,
}

impl RiskAssessment {
    #[must_use]
    pub fn new(
        prediction: &PredictionResult,
        risk_factors: RiskFactorMap,
        recommendations: Vec<String>,
    ) -> Self {
        let risk_level = prediction.risk_level();
        let ci = prediction.confidence_interval;
        Self {
            risk_prediction: risk_level.label(),
            risk_probability: round3(prediction.adjusted_probability),
            confidence_interval: [round3(ci.lower), round3(ci.upper)],
            risk_factors,
            recommendations,
            disclaimer: DISCLAIMER,
            risk_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_probability() {
        assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.3499), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.35), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.5999), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(1.0), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_is_monotone() {
        let mut previous = RiskLevel::Low;
        for i in 0..=1000 {
            let level = RiskLevel::from_probability(f64::from(i) / 1000.0);
            assert!(level >= previous);
            previous = level;
        }
        assert_eq!(previous, RiskLevel::High);
    }

    #[test]
    fn test_final_label_threshold() {
        let ci = ConfidenceInterval {
            lower: 0.0,
            upper: 1.0,
        };
        assert_eq!(PredictionResult::new(0.49, ci).final_label, 0);
        assert_eq!(PredictionResult::new(0.5, ci).final_label, 1);
    }

    #[test]
    fn test_assessment_rounds_to_three_decimals() {
        let prediction = PredictionResult::new(
            0.612_345,
            ConfidenceInterval {
                lower: 0.512_345,
                upper: 0.712_99,
            },
        );
        let assessment = RiskAssessment::new(&prediction, RiskFactorMap::default(), Vec::new());

        assert_eq!(assessment.risk_prediction, "High Risk");
        assert!((assessment.risk_probability - 0.612).abs() < 1e-12);
        assert!((assessment.confidence_interval[0] - 0.512).abs() < 1e-12);
        assert!((assessment.confidence_interval[1] - 0.713).abs() < 1e-12);
        assert_eq!(assessment.disclaimer, DISCLAIMER);
    }

    #[test]
    fn test_assessment_json_shape() {
        let prediction = PredictionResult::new(
            0.2,
            ConfidenceInterval {
                lower: 0.1,
                upper: 0.3,
            },
        );
        let assessment =
            RiskAssessment::new(&prediction, RiskFactorMap::default(), vec!["a".into()]);
        let value = serde_json::to_value(&assessment).expect("json");

        assert_eq!(value["risk_prediction"], "Low Risk");
        assert_eq!(value["recommendations"][0], "a");
        assert!(value["risk_factors"].as_object().is_some_and(|m| m.is_empty()));
        assert!(value.get("risk_level").is_none());
    }
}
