//! Recommendation synthesis.
//!
//! An append-only list: the tier block first, then one block per matching
//! factor rule, then reinforcement for low-risk profiles. No deduplication.

use crate::domain::assessment::RiskLevel;
use crate::domain::risk_factors::{RiskFactor, RiskFactorMap, Severity};

const HIGH_TIER: &[&str] = &[
    "HIGH PRIORITY: See a cardiologist IMMEDIATELY",
    "Urgent tests: ECG, full lipid panel, echocardiogram",
    "Discuss preventive medication with your doctor (statins, aspirin)",
    "Monitor your blood pressure weekly",
];

const MODERATE_TIER: &[&str] = &[
    "Schedule a medical consultation within the next 2-4 weeks",
    "Get cardiovascular tests: ECG, lipid panel",
    "Medical check-ups every 3-6 months",
    "Monitor your blood pressure monthly",
];

const LOW_TIER: &[&str] = &[
    "Excellent cardiovascular profile - keep it up",
    "Keep up annual preventive check-ups",
    "Focus on maintaining your current healthy habits",
    "Your lifestyle is protecting your heart",
];

const CURRENT_SMOKER: &[&str] = &[
    "CRITICAL: Quit smoking TODAY - it is your #1 priority",
    "Smoking cessation helpline: get professional support",
];
const FORMER_SMOKER: &[&str] = &["Well done for quitting smoking - stay smoke-free"];

const SEDENTARY: &[&str] = &[
    "URGENT: Start a gradual exercise program",
    "Begin with 15 minutes of walking a day and increase gradually",
    "Goal: 150 minutes of moderate exercise per week",
];
const ACTIVE_PRAISE: &[&str] = &["Your exercise level is protecting your heart"];

const OBESITY: &[&str] = &[
    "IMPORTANT: Weight-loss plan with a nutritionist",
    "A Mediterranean diet is recommended for cardiovascular health",
    "Initial goal: reduce your current weight by 5-10%",
];

const SEVERE_STRESS: &[&str] = &[
    "URGENT: Stress management techniques - meditation, yoga",
    "Prioritize 7-8 hours of restful sleep",
    "Consider psychological support for stress management",
];
const ELEVATED_STRESS: &[&str] = &["Practice daily relaxation: 10-15 minutes"];

const DIABETES: &[&str] = &[
    "CRITICAL: Strict diabetes control with an endocrinologist",
    "Target glycated hemoglobin (HbA1c): < 7%",
    "See a nutritionist specialized in diabetes",
];

const ALCOHOL: &[&str] = &[
    "Reduce alcohol intake: at most 1-2 drinks per day",
    "Consider alcohol-free days during the week",
];

const EXCELLENT_PROFILE: &[&str] = &[
    "Congratulations! Your cardiovascular profile is excellent",
    "Your healthy habits are your best preventive medicine",
];

/// Probability under which active, low-risk patients get praise.
const PRAISE_THRESHOLD: f64 = 0.35;

/// Probability under which the congratulatory closing is added.
const EXCELLENT_THRESHOLD: f64 = 0.2;

/// Block-producing rule.
pub struct RecommendationRule {
    pub id: &'static str,
    pub evaluate: fn(f64, &RiskFactorMap) -> &'static [&'static str],
}

fn tier(p: f64, _: &RiskFactorMap) -> &'static [&'static str] {
    match RiskLevel::from_probability(p) {
        RiskLevel::High => HIGH_TIER,
        RiskLevel::Moderate => MODERATE_TIER,
        RiskLevel::Low => LOW_TIER,
    }
}

fn smoking(_: f64, factors: &RiskFactorMap) -> &'static [&'static str] {
    match factors.get(RiskFactor::Smoking).map(|e| e.severity) {
        Some(Severity::Severe | Severity::Extreme) => CURRENT_SMOKER,
        Some(Severity::Elevated) => FORMER_SMOKER,
        None => &[],
    }
}

fn activity(p: f64, factors: &RiskFactorMap) -> &'static [&'static str] {
    if factors.contains(RiskFactor::Sedentary) {
        SEDENTARY
    } else if p < PRAISE_THRESHOLD {
        ACTIVE_PRAISE
    } else {
        &[]
    }
}

fn obesity(_: f64, factors: &RiskFactorMap) -> &'static [&'static str] {
    if factors.contains(RiskFactor::Obesity) {
        OBESITY
    } else {
        &[]
    }
}

fn stress(_: f64, factors: &RiskFactorMap) -> &'static [&'static str] {
    // The urgent block is reserved for the very-high band (stress 8).
    match factors.get(RiskFactor::Stress).map(|e| e.severity) {
        Some(Severity::Severe) => SEVERE_STRESS,
        Some(Severity::Elevated | Severity::Extreme) => ELEVATED_STRESS,
        None => &[],
    }
}

fn diabetes(_: f64, factors: &RiskFactorMap) -> &'static [&'static str] {
    if factors.contains(RiskFactor::Diabetes) {
        DIABETES
    } else {
        &[]
    }
}

fn alcohol(_: f64, factors: &RiskFactorMap) -> &'static [&'static str] {
    if factors.contains(RiskFactor::Alcohol) {
        ALCOHOL
    } else {
        &[]
    }
}

fn excellent_profile(p: f64, _: &RiskFactorMap) -> &'static [&'static str] {
    if p < EXCELLENT_THRESHOLD {
        EXCELLENT_PROFILE
    } else {
        &[]
    }
}

/// Rules in output order.
pub static RECOMMENDATION_RULES: &[RecommendationRule] = &[
    RecommendationRule { id: "tier", evaluate: tier },
    RecommendationRule { id: "smoking", evaluate: smoking },
    RecommendationRule { id: "activity", evaluate: activity },
    RecommendationRule { id: "obesity", evaluate: obesity },
    RecommendationRule { id: "stress", evaluate: stress },
    RecommendationRule { id: "diabetes", evaluate: diabetes },
    RecommendationRule { id: "alcohol", evaluate: alcohol },
    RecommendationRule { id: "excellent_profile", evaluate: excellent_profile },
];

pub struct RecommendationGenerator;

impl RecommendationGenerator {
    /// Never empty: the tier block always contributes.
    #[must_use]
    pub fn generate(adjusted_probability: f64, factors: &RiskFactorMap) -> Vec<String> {
        let mut recommendations = Vec::new();
        for rule in RECOMMENDATION_RULES {
            let block = (rule.evaluate)(adjusted_probability, factors);
            if !block.is_empty() {
                tracing::trace!(rule = rule.id, lines = block.len(), "Recommendation block added");
            }
            recommendations.extend(block.iter().map(|line| (*line).to_string()));
        }
        recommendations
    }

    /// Opening line for a probability's tier.
    #[must_use]
    pub fn opening_line(adjusted_probability: f64) -> &'static str {
        tier(adjusted_probability, &RiskFactorMap::default())[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::{AlcoholIntake, Gender, PatientRecord, Smoking, YesNo};
    use crate::domain::risk_factors::RiskFactorExtractor;

    fn factors_for(record: &PatientRecord) -> RiskFactorMap {
        RiskFactorExtractor::extract(record)
    }

    #[test]
    fn test_tier_blocks_lead() {
        let empty = RiskFactorMap::default();
        assert_eq!(RecommendationGenerator::generate(0.7, &empty)[0], HIGH_TIER[0]);
        assert_eq!(RecommendationGenerator::generate(0.4, &empty)[0], MODERATE_TIER[0]);
        assert_eq!(RecommendationGenerator::generate(0.3, &empty)[0], LOW_TIER[0]);
        assert_eq!(RecommendationGenerator::opening_line(0.6), HIGH_TIER[0]);
    }

    #[test]
    fn test_low_risk_reinforcement() {
        let empty = RiskFactorMap::default();
        let very_low = RecommendationGenerator::generate(0.1, &empty);
        assert_eq!(very_low.len(), 4 + 1 + 2);
        assert_eq!(very_low[4], ACTIVE_PRAISE[0]);
        assert_eq!(very_low[6], EXCELLENT_PROFILE[1]);

        let low = RecommendationGenerator::generate(0.25, &empty);
        assert_eq!(low.len(), 5);

        let moderate = RecommendationGenerator::generate(0.35, &empty);
        assert_eq!(moderate.len(), 4);
    }

    #[test]
    fn test_high_risk_blocks_in_rule_order() {
        let record = PatientRecord {
            age: 68,
            gender: Gender::Male,
            smoking: Smoking::Current,
            alcohol_intake: AlcoholIntake::Heavy,
            exercise_hours: 0.0,
            diabetes: YesNo::Yes,
            family_history: YesNo::Yes,
            obesity: YesNo::Yes,
            stress_level: 8,
        };
        let recs = RecommendationGenerator::generate(0.9, &factors_for(&record));

        let mut expected: Vec<&str> = Vec::new();
        for block in [
            HIGH_TIER,
            CURRENT_SMOKER,
            SEDENTARY,
            OBESITY,
            SEVERE_STRESS,
            DIABETES,
            ALCOHOL,
        ] {
            expected.extend_from_slice(block);
        }
        assert_eq!(recs, expected);
    }

    #[test]
    fn test_former_smoker_and_mild_stress() {
        let record = PatientRecord {
            smoking: Smoking::Former,
            stress_level: 7,
            ..PatientRecord::example_record()
        };
        let recs = RecommendationGenerator::generate(0.4, &factors_for(&record));
        assert!(recs.contains(&FORMER_SMOKER[0].to_string()));
        assert!(recs.contains(&ELEVATED_STRESS[0].to_string()));
        assert!(!recs.contains(&CURRENT_SMOKER[0].to_string()));
    }

    #[test]
    fn test_only_very_high_stress_gets_urgent_block() {
        for (level, urgent) in [(6, false), (7, false), (8, true), (9, false), (10, false)] {
            let record = PatientRecord {
                stress_level: level,
                ..PatientRecord::example_record()
            };
            let recs = RecommendationGenerator::generate(0.4, &factors_for(&record));
            assert_eq!(recs.len(), MODERATE_TIER.len() + if urgent { 3 } else { 1 });
            assert_eq!(recs.contains(&SEVERE_STRESS[0].to_string()), urgent, "stress {level}");
            assert_eq!(recs.contains(&ELEVATED_STRESS[0].to_string()), !urgent, "stress {level}");
        }
    }

    #[test]
    fn test_low_activity_is_not_sedentary() {
        let record = PatientRecord {
            exercise_hours: 2.0,
            ..PatientRecord::example_record()
        };
        let recs = RecommendationGenerator::generate(0.3, &factors_for(&record));
        assert!(!recs.contains(&SEDENTARY[0].to_string()));
        assert!(recs.contains(&ACTIVE_PRAISE[0].to_string()));
    }
}
