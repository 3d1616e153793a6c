//! Medical adjustment of the classifier's probability.
//!
//! Domain rules accumulate a risk score and a protective score, the net is
//! blended with the model output using weights that depend on how much the
//! rules found, and a fixed sequence of special-case overrides runs last.
//!
//! Men accrue age risk earlier; women are modeled with hormonal protection
//! until a later age.

use crate::domain::patient::{AlcoholIntake, Gender, PatientRecord, Smoking};
use crate::domain::rules::{
    apply_overrides, at_least, at_most, AppliedOverride, Bound, Contribution, OverrideRule,
    ScoreCard, ScoreRule,
};

/// Bounds of the rule-only probability before blending.
pub const LOGIC_PROBABILITY_RANGE: (f64, f64) = (0.02, 0.98);

/// Bounds of the reported probability.
pub const ADJUSTED_PROBABILITY_RANGE: (f64, f64) = (0.01, 0.99);

const MALE_AGE_RISK: [(f64, f64); 4] = [(65.0, 0.28), (55.0, 0.18), (45.0, 0.12), (35.0, 0.05)];
const FEMALE_AGE_RISK: [(f64, f64); 4] = [(70.0, 0.25), (60.0, 0.15), (50.0, 0.08), (40.0, 0.03)];
const EXERCISE_PROTECTION: [(f64, f64); 5] =
    [(7.0, 0.20), (5.0, 0.16), (3.0, 0.12), (1.5, 0.07), (1.0, 0.03)];
const STRESS_PROTECTION: [(f64, f64); 3] = [(2.0, 0.12), (4.0, 0.08), (6.0, 0.04)];

fn age(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    let age = f64::from(record.age);
    let (bands, young_limit, young_protection) = match record.gender {
        Gender::Male => (&MALE_AGE_RISK, 25.0, 0.18),
        Gender::Female => (&FEMALE_AGE_RISK, 30.0, 0.20),
    };
    at_least(age, bands).map(Contribution::risk).or_else(|| {
        (age <= young_limit).then_some(Contribution::protective(young_protection))
    })
}

fn smoking(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    match record.smoking {
        Smoking::Current => {
            let surcharge = at_least(f64::from(record.age), &[(50.0, 0.08), (35.0, 0.04)]);
            Some(Contribution::risk(0.22 + surcharge.unwrap_or(0.0)))
        }
        Smoking::Former => Some(Contribution::risk(if record.age >= 50 { 0.08 } else { 0.04 })),
        Smoking::Never => None,
    }
}

fn diabetes(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    record
        .is_diabetic()
        .then(|| Contribution::risk(if record.age >= 50 { 0.25 } else { 0.20 }))
}

fn obesity(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    record
        .is_obese()
        .then(|| Contribution::risk(if record.age <= 40 { 0.15 } else { 0.12 }))
}

fn family_history(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    record
        .has_family_history()
        .then(|| Contribution::risk(if record.age <= 45 { 0.12 } else { 0.08 }))
}

fn heavy_alcohol(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    record
        .drinks_heavily()
        .then(|| Contribution::risk(if record.age >= 50 { 0.12 } else { 0.08 }))
}

/// High stress compounds whatever risk has already accumulated.
fn stress(record: &PatientRecord, card: &ScoreCard) -> Option<Contribution> {
    if record.stress_level >= 8 {
        let synergy = (1.0 + card.risk() * 0.5).min(1.5);
        Some(Contribution::risk(0.12 * synergy))
    } else if record.stress_level >= 6 {
        Some(Contribution::risk(0.06))
    } else {
        None
    }
}

fn exercise(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    let hours = record.exercise_hours;
    if let Some(protection) = at_least(hours, &EXERCISE_PROTECTION) {
        Some(Contribution::protective(protection))
    } else if hours < 0.5 {
        Some(Contribution::risk(0.12))
    } else {
        // [0.5, 1)
        Some(Contribution::risk(0.08))
    }
}

fn never_smoked(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    record
        .never_smoked()
        .then(|| Contribution::protective(if record.age >= 50 { 0.15 } else { 0.10 }))
}

fn alcohol_moderation(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    match record.alcohol_intake {
        AlcoholIntake::None => Some(Contribution::protective(0.06)),
        AlcoholIntake::Light => Some(Contribution::protective(0.08)),
        AlcoholIntake::Moderate => Some(Contribution::protective(if record.age >= 40 {
            0.04
        } else {
            0.01
        })),
        AlcoholIntake::Heavy => None,
    }
}

fn low_stress(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    at_most(f64::from(record.stress_level), &STRESS_PROTECTION).map(Contribution::protective)
}

fn no_diabetes(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    (!record.is_diabetic()).then_some(Contribution::protective(0.06))
}

fn no_obesity(record: &PatientRecord, _: &ScoreCard) -> Option<Contribution> {
    (!record.is_obese()).then_some(Contribution::protective(0.06))
}

fn clean_profile(record: &PatientRecord, card: &ScoreCard) -> Option<Contribution> {
    let conditions_absent =
        card.has_fired("no_diabetes") as u8 + card.has_fired("no_obesity") as u8;
    (conditions_absent == 2 && record.never_smoked()).then_some(Contribution::protective(0.05))
}

/// Additive rules in evaluation order. Only `stress` depends on order: it
/// sees the risk from the rules above it but not the sedentary penalty.
pub static SCORE_RULES: &[ScoreRule] = &[
    ScoreRule { id: "age", evaluate: age },
    ScoreRule { id: "smoking", evaluate: smoking },
    ScoreRule { id: "diabetes", evaluate: diabetes },
    ScoreRule { id: "obesity", evaluate: obesity },
    ScoreRule { id: "family_history", evaluate: family_history },
    ScoreRule { id: "heavy_alcohol", evaluate: heavy_alcohol },
    ScoreRule { id: "stress", evaluate: stress },
    ScoreRule { id: "exercise", evaluate: exercise },
    ScoreRule { id: "never_smoked", evaluate: never_smoked },
    ScoreRule { id: "alcohol_moderation", evaluate: alcohol_moderation },
    ScoreRule { id: "low_stress", evaluate: low_stress },
    ScoreRule { id: "no_diabetes", evaluate: no_diabetes },
    ScoreRule { id: "no_obesity", evaluate: no_obesity },
    ScoreRule { id: "clean_profile", evaluate: clean_profile },
];

fn young_and_healthy(r: &PatientRecord) -> Option<Bound> {
    (r.age <= 25
        && r.never_smoked()
        && !r.is_diabetic()
        && !r.is_obese()
        && r.exercise_hours >= 3.0
        && r.stress_level <= 5)
        .then_some(Bound::Ceiling(0.12))
}

fn older_diabetic_smoker(r: &PatientRecord) -> Option<Bound> {
    (r.age >= 60 && r.is_current_smoker() && r.is_diabetic()).then_some(Bound::Floor(0.65))
}

fn young_active_woman(r: &PatientRecord) -> Option<Bound> {
    (r.gender == Gender::Female && r.age <= 35 && r.never_smoked() && r.exercise_hours >= 2.0)
        .then_some(Bound::Ceiling(0.08))
}

fn young_male_smoker_with_condition(r: &PatientRecord) -> Option<Bound> {
    (r.is_male() && r.age <= 35 && r.is_current_smoker() && (r.is_diabetic() || r.is_obese()))
        .then_some(Bound::Floor(0.25))
}

fn metabolic_syndrome(r: &PatientRecord) -> Option<Bound> {
    (r.is_obese() && r.is_diabetic() && r.is_sedentary()).then_some(Bound::Floor(0.55))
}

fn athletic_non_smoker(r: &PatientRecord) -> Option<Bound> {
    (r.exercise_hours >= 6.0 && r.never_smoked() && r.stress_level <= 4)
        .then_some(Bound::Scale(0.8))
}

/// Number of major risk factors present (0-7).
#[must_use]
pub fn major_risk_factors(r: &PatientRecord) -> usize {
    [
        r.is_current_smoker(),
        r.is_diabetic(),
        r.is_obese(),
        r.has_family_history(),
        r.is_sedentary(),
        r.high_stress(),
        r.drinks_heavily(),
    ]
    .iter()
    .filter(|&&present| present)
    .count()
}

fn multiple_risk_factors(r: &PatientRecord) -> Option<Bound> {
    let floor = match major_risk_factors(r) {
        n if n >= 4 => at_least(f64::from(r.age), &[(50.0, 0.60), (30.0, 0.45)]).or(Some(0.35)),
        3 => at_least(f64::from(r.age), &[(45.0, 0.50), (25.0, 0.40)]),
        2 => (r.age >= 55).then_some(0.40),
        _ => None,
    };
    floor.map(Bound::Floor)
}

fn smoking_diabetes_synergy(r: &PatientRecord) -> Option<Bound> {
    (r.is_current_smoker() && r.is_diabetic()).then_some(Bound::Scale(1.15))
}

fn stress_sedentary_synergy(r: &PatientRecord) -> Option<Bound> {
    (r.high_stress() && r.is_sedentary()).then_some(Bound::Scale(1.10))
}

/// Special cases applied after blending, in this fixed order.
pub static OVERRIDE_RULES: &[OverrideRule] = &[
    OverrideRule { id: "young_and_healthy", evaluate: young_and_healthy },
    OverrideRule { id: "older_diabetic_smoker", evaluate: older_diabetic_smoker },
    OverrideRule { id: "young_active_woman", evaluate: young_active_woman },
    OverrideRule {
        id: "young_male_smoker_with_condition",
        evaluate: young_male_smoker_with_condition,
    },
    OverrideRule { id: "metabolic_syndrome", evaluate: metabolic_syndrome },
    OverrideRule { id: "athletic_non_smoker", evaluate: athletic_non_smoker },
    OverrideRule { id: "multiple_risk_factors", evaluate: multiple_risk_factors },
    OverrideRule { id: "smoking_diabetes_synergy", evaluate: smoking_diabetes_synergy },
    OverrideRule { id: "stress_sedentary_synergy", evaluate: stress_sedentary_synergy },
];

/// Model vs. rule weighting used for the blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub model: f64,
    pub logic: f64,
}

impl BlendWeights {
    /// The more evidence the rules found, the more they are trusted.
    #[must_use]
    pub fn for_total(total_factors: f64) -> Self {
        let (model, logic) = if total_factors > 0.4 {
            (0.45, 0.55)
        } else if total_factors > 0.2 {
            (0.55, 0.45)
        } else {
            (0.65, 0.35)
        };
        Self { model, logic }
    }
}

/// Every intermediate value of one adjustment, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub base_probability: f64,
    pub scores: ScoreCard,
    pub weights: BlendWeights,
    pub logic_probability: f64,
    pub blended_probability: f64,
    pub overrides: Vec<AppliedOverride>,
    pub adjusted_probability: f64,
}

/// Blends the classifier probability with the rule tables.
pub struct MedicalAdjustmentEngine {
    score_rules: &'static [ScoreRule],
    override_rules: &'static [OverrideRule],
}

impl Default for MedicalAdjustmentEngine {
    fn default() -> Self {
        Self {
            score_rules: SCORE_RULES,
            override_rules: OVERRIDE_RULES,
        }
    }
}

impl MedicalAdjustmentEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjusted probability in `[0.01, 0.99]`.
    ///
    /// `base_probability` must already be a finite value in `[0, 1]`.
    #[must_use]
    pub fn adjust(&self, record: &PatientRecord, base_probability: f64) -> f64 {
        self.explain(record, base_probability).adjusted_probability
    }

    /// Run the full adjustment and keep every intermediate value.
    #[must_use]
    pub fn explain(&self, record: &PatientRecord, base_probability: f64) -> Adjustment {
        let scores = ScoreCard::evaluate(self.score_rules, record);
        let weights = BlendWeights::for_total(scores.total());

        let (lo, hi) = LOGIC_PROBABILITY_RANGE;
        let logic_probability = (base_probability + scores.net()).clamp(lo, hi);
        let blended_probability =
            weights.model * base_probability + weights.logic * logic_probability;

        let (overridden, overrides) =
            apply_overrides(self.override_rules, record, blended_probability);
        let (lo, hi) = ADJUSTED_PROBABILITY_RANGE;
        let adjusted_probability = overridden.clamp(lo, hi);

        tracing::debug!(
            risk_score = scores.risk(),
            protective_score = scores.protective(),
            model_weight = weights.model,
            logic_probability,
            blended_probability,
            overrides = overrides.len(),
            adjusted_probability,
            "Applied medical adjustment"
        );
        for applied in &overrides {
            tracing::trace!(
                rule = applied.id,
                before = applied.before,
                after = applied.after,
                "Override matched"
            );
        }

        Adjustment {
            base_probability,
            scores,
            weights,
            logic_probability,
            blended_probability,
            overrides,
            adjusted_probability,
        }
    }
}
