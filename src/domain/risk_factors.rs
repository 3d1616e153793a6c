//! Human-readable risk factors extracted from the patient record alone.
//!
//! Nothing here looks at any probability, so the same record always yields
//! the same map no matter which classifier is loaded.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::patient::{Gender, PatientRecord, Smoking};

/// Key of a risk factor entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskFactor {
    Age,
    Smoking,
    Diabetes,
    Obesity,
    FamilyHistory,
    Sedentary,
    LowActivity,
    Stress,
    Alcohol,
    /// Current smoker with diabetes
    SmokingWithDiabetes,
    /// Obesity, diabetes and under an hour of weekly exercise
    MetabolicSyndrome,
    /// High stress with under an hour of weekly exercise
    StressWithInactivity,
}

impl RiskFactor {
    /// Key shown to callers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Smoking => "Smoking",
            Self::Diabetes => "Diabetes",
            Self::Obesity => "Obesity",
            Self::FamilyHistory => "Family History",
            Self::Sedentary => "Sedentary Lifestyle",
            Self::LowActivity => "Low Activity",
            Self::Stress => "Stress",
            Self::Alcohol => "Alcohol",
            Self::SmokingWithDiabetes => "CRITICAL COMBINATION",
            Self::MetabolicSyndrome => "METABOLIC SYNDROME",
            Self::StressWithInactivity => "VICIOUS CYCLE",
        }
    }

    /// Whether the entry flags a dangerous combination of factors.
    #[must_use]
    pub fn is_combination(&self) -> bool {
        matches!(
            self,
            Self::SmokingWithDiabetes | Self::MetabolicSyndrome | Self::StressWithInactivity
        )
    }
}

/// How strongly a factor weighs on the recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Elevated,
    Severe,
    /// Stress 9-10 only
    Extreme,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskFactorEntry {
    pub factor: RiskFactor,
    pub severity: Severity,
    pub description: String,
}

impl RiskFactorEntry {
    fn new(factor: RiskFactor, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            factor,
            severity,
            description: description.into(),
        }
    }
}

/// Insertion-ordered factor map. Each key appears at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskFactorMap {
    entries: Vec<RiskFactorEntry>,
}

impl RiskFactorMap {
    fn insert(&mut self, entry: RiskFactorEntry) {
        match self.entries.iter_mut().find(|e| e.factor == entry.factor) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    #[must_use]
    pub fn get(&self, factor: RiskFactor) -> Option<&RiskFactorEntry> {
        self.entries.iter().find(|e| e.factor == factor)
    }

    #[must_use]
    pub fn contains(&self, factor: RiskFactor) -> bool {
        self.get(factor).is_some()
    }

    /// Whether `factor` is present at `severity` or worse.
    #[must_use]
    pub fn is_at_least(&self, factor: RiskFactor, severity: Severity) -> bool {
        self.get(factor).is_some_and(|e| e.severity >= severity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RiskFactorEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for RiskFactorMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.factor.label(), &entry.description)?;
        }
        map.end()
    }
}

/// Whole hours keep one decimal: `0.0`, `1.5`, `0.25`.
fn hours(h: f64) -> String {
    if h.fract() == 0.0 {
        format!("{h:.1}")
    } else {
        format!("{h}")
    }
}

fn age(r: &PatientRecord) -> Option<RiskFactorEntry> {
    let (severity, note) = match (r.gender, r.age) {
        (Gender::Male, a) if a >= 60 => (Severity::Severe, "high risk from advanced age"),
        (Gender::Male, a) if a >= 45 => (Severity::Elevated, "moderate age-related risk"),
        (Gender::Male, a) if a >= 35 => (Severity::Elevated, "onset of age-related risk"),
        (Gender::Female, a) if a >= 65 => (Severity::Severe, "high post-menopausal risk"),
        (Gender::Female, a) if a >= 55 => (Severity::Elevated, "moderate post-menopausal risk"),
        (Gender::Female, a) if a >= 50 => (Severity::Elevated, "menopausal transition"),
        _ => return None,
    };
    let who = match r.gender {
        Gender::Male => "Male",
        Gender::Female => "Female",
    };
    Some(RiskFactorEntry::new(
        RiskFactor::Age,
        severity,
        format!("{} years - {who} ({note})", r.age),
    ))
}

fn smoking(r: &PatientRecord) -> Option<RiskFactorEntry> {
    let entry = match r.smoking {
        Smoking::Current if r.age >= 50 => RiskFactorEntry::new(
            RiskFactor::Smoking,
            Severity::Severe,
            "Current smoker - CRITICAL at your age (cumulative damage)",
        ),
        Smoking::Current => RiskFactorEntry::new(
            RiskFactor::Smoking,
            Severity::Severe,
            "Current smoker - major modifiable risk factor",
        ),
        Smoking::Former => RiskFactorEntry::new(
            RiskFactor::Smoking,
            Severity::Elevated,
            "Former smoker (residual risk, but congratulations on quitting!)",
        ),
        Smoking::Never => return None,
    };
    Some(entry)
}

fn diabetes(r: &PatientRecord) -> Option<RiskFactorEntry> {
    r.is_diabetic().then(|| {
        let text = if r.age >= 50 {
            "Diabetes present - VERY SERIOUS at your age (doubles cardiovascular risk)"
        } else {
            "Diabetes present - requires strict control to prevent complications"
        };
        RiskFactorEntry::new(RiskFactor::Diabetes, Severity::Severe, text)
    })
}

fn obesity(r: &PatientRecord) -> Option<RiskFactorEntry> {
    r.is_obese().then(|| {
        let text = if r.age <= 40 {
            "Obesity present - especially concerning at your age"
        } else {
            "Obesity present - important modifiable risk factor"
        };
        RiskFactorEntry::new(RiskFactor::Obesity, Severity::Elevated, text)
    })
}

fn family_history(r: &PatientRecord) -> Option<RiskFactorEntry> {
    r.has_family_history().then(|| {
        if r.age <= 45 {
            RiskFactorEntry::new(
                RiskFactor::FamilyHistory,
                Severity::Severe,
                "Positive family history - HIGHLY RELEVANT at your age (genetic predisposition)",
            )
        } else {
            RiskFactorEntry::new(
                RiskFactor::FamilyHistory,
                Severity::Elevated,
                "Positive family history - raises baseline risk",
            )
        }
    })
}

fn exercise(r: &PatientRecord) -> Option<RiskFactorEntry> {
    let h = r.exercise_hours;
    if h < 0.5 {
        Some(RiskFactorEntry::new(
            RiskFactor::Sedentary,
            Severity::Severe,
            format!("Extreme sedentary lifestyle - only {}h/week (change URGENTLY!)", hours(h)),
        ))
    } else if h < 1.5 {
        Some(RiskFactorEntry::new(
            RiskFactor::Sedentary,
            Severity::Elevated,
            format!(
                "Insufficient activity - {}h/week (recommended minimum: 2.5h)",
                hours(h)
            ),
        ))
    } else if h < 2.5 {
        Some(RiskFactorEntry::new(
            RiskFactor::LowActivity,
            Severity::Elevated,
            format!("Exercise below optimal - {}h/week", hours(h)),
        ))
    } else {
        None
    }
}

fn stress(r: &PatientRecord) -> Option<RiskFactorEntry> {
    let s = r.stress_level;
    let (severity, text) = if s >= 9 {
        (
            Severity::Extreme,
            format!("Extreme stress - level {s}/10 (CRISIS! Directly affects the heart)"),
        )
    } else if s >= 8 {
        (
            Severity::Severe,
            format!("Very high stress - level {s}/10 (proven cardiovascular damage)"),
        )
    } else if s >= 6 {
        (
            Severity::Elevated,
            format!("Elevated stress - level {s}/10 (can raise blood pressure)"),
        )
    } else {
        return None;
    };
    Some(RiskFactorEntry::new(RiskFactor::Stress, severity, text))
}

fn alcohol(r: &PatientRecord) -> Option<RiskFactorEntry> {
    r.drinks_heavily().then(|| {
        let text = if r.age >= 50 {
            "High alcohol intake - especially harmful at your age"
        } else {
            "High alcohol intake - cardiovascular risk factor"
        };
        RiskFactorEntry::new(RiskFactor::Alcohol, Severity::Severe, text)
    })
}

fn smoking_with_diabetes(r: &PatientRecord) -> Option<RiskFactorEntry> {
    (r.is_current_smoker() && r.is_diabetic()).then(|| {
        RiskFactorEntry::new(
            RiskFactor::SmokingWithDiabetes,
            Severity::Severe,
            "Diabetes + smoking = exponential risk",
        )
    })
}

fn metabolic_syndrome(r: &PatientRecord) -> Option<RiskFactorEntry> {
    (r.is_obese() && r.is_diabetic() && r.is_sedentary()).then(|| {
        RiskFactorEntry::new(
            RiskFactor::MetabolicSyndrome,
            Severity::Severe,
            "Obesity + diabetes + sedentary lifestyle = very high risk",
        )
    })
}

fn stress_with_inactivity(r: &PatientRecord) -> Option<RiskFactorEntry> {
    (r.high_stress() && r.is_sedentary()).then(|| {
        RiskFactorEntry::new(
            RiskFactor::StressWithInactivity,
            Severity::Severe,
            "High stress + sedentary lifestyle = each reinforces the other",
        )
    })
}

/// Text-producing rule.
pub struct FactorRule {
    pub id: &'static str,
    pub evaluate: fn(&PatientRecord) -> Option<RiskFactorEntry>,
}

/// Extraction rules; map order follows this table.
pub static FACTOR_RULES: &[FactorRule] = &[
    FactorRule { id: "age", evaluate: age },
    FactorRule { id: "smoking", evaluate: smoking },
    FactorRule { id: "diabetes", evaluate: diabetes },
    FactorRule { id: "obesity", evaluate: obesity },
    FactorRule { id: "family_history", evaluate: family_history },
    FactorRule { id: "exercise", evaluate: exercise },
    FactorRule { id: "stress", evaluate: stress },
    FactorRule { id: "alcohol", evaluate: alcohol },
    FactorRule { id: "smoking_with_diabetes", evaluate: smoking_with_diabetes },
    FactorRule { id: "metabolic_syndrome", evaluate: metabolic_syndrome },
    FactorRule { id: "stress_with_inactivity", evaluate: stress_with_inactivity },
];

pub struct RiskFactorExtractor;

impl RiskFactorExtractor {
    #[must_use]
    pub fn extract(record: &PatientRecord) -> RiskFactorMap {
        let mut map = RiskFactorMap::default();
        for rule in FACTOR_RULES {
            if let Some(entry) = (rule.evaluate)(record) {
                tracing::trace!(rule = rule.id, factor = entry.factor.label(), "Risk factor found");
                map.insert(entry);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::{AlcoholIntake, YesNo};

    fn worst_case() -> PatientRecord {
        PatientRecord {
            age: 68,
            gender: Gender::Male,
            smoking: Smoking::Current,
            alcohol_intake: AlcoholIntake::Heavy,
            exercise_hours: 0.0,
            diabetes: YesNo::Yes,
            family_history: YesNo::Yes,
            obesity: YesNo::Yes,
            stress_level: 10,
        }
    }

    #[test]
    fn test_worst_case_emits_every_factor_in_order() {
        let map = RiskFactorExtractor::extract(&worst_case());
        let keys: Vec<_> = map.iter().map(|e| e.factor).collect();
        assert_eq!(
            keys,
            vec![
                RiskFactor::Age,
                RiskFactor::Smoking,
                RiskFactor::Diabetes,
                RiskFactor::Obesity,
                RiskFactor::FamilyHistory,
                RiskFactor::Sedentary,
                RiskFactor::Stress,
                RiskFactor::Alcohol,
                RiskFactor::SmokingWithDiabetes,
                RiskFactor::MetabolicSyndrome,
                RiskFactor::StressWithInactivity,
            ]
        );
        assert_eq!(map.iter().filter(|e| e.factor.is_combination()).count(), 3);
        assert_eq!(
            map.get(RiskFactor::Sedentary).map(|e| e.description.as_str()),
            Some("Extreme sedentary lifestyle - only 0.0h/week (change URGENTLY!)")
        );
        assert!(map
            .get(RiskFactor::Smoking)
            .is_some_and(|e| e.description.contains("CRITICAL")));
    }

    #[test]
    fn test_healthy_record_is_empty() {
        let record = PatientRecord {
            age: 30,
            gender: Gender::Female,
            smoking: Smoking::Never,
            alcohol_intake: AlcoholIntake::Light,
            exercise_hours: 4.0,
            diabetes: YesNo::No,
            family_history: YesNo::No,
            obesity: YesNo::No,
            stress_level: 3,
        };
        assert!(RiskFactorExtractor::extract(&record).is_empty());
    }

    #[test]
    fn test_age_bands_are_gendered() {
        let man = PatientRecord {
            age: 50,
            ..PatientRecord::example_record()
        };
        let woman = PatientRecord {
            gender: Gender::Female,
            ..man
        };
        let woman_49 = PatientRecord { age: 49, ..woman };

        let man_age = RiskFactorExtractor::extract(&man);
        assert_eq!(
            man_age.get(RiskFactor::Age).map(|e| e.description.as_str()),
            Some("50 years - Male (moderate age-related risk)")
        );
        assert_eq!(
            RiskFactorExtractor::extract(&woman)
                .get(RiskFactor::Age)
                .map(|e| e.description.as_str()),
            Some("50 years - Female (menopausal transition)")
        );
        assert!(!RiskFactorExtractor::extract(&woman_49).contains(RiskFactor::Age));
    }

    #[test]
    fn test_exercise_bands_emit_one_entry() {
        let at = |h: f64| {
            RiskFactorExtractor::extract(&PatientRecord {
                exercise_hours: h,
                ..PatientRecord::example_record()
            })
        };
        assert!(at(0.2).is_at_least(RiskFactor::Sedentary, Severity::Severe));
        let insufficient = at(1.2);
        assert!(insufficient.contains(RiskFactor::Sedentary));
        assert!(!insufficient.is_at_least(RiskFactor::Sedentary, Severity::Severe));
        assert_eq!(
            insufficient
                .get(RiskFactor::Sedentary)
                .map(|e| e.description.as_str()),
            Some("Insufficient activity - 1.2h/week (recommended minimum: 2.5h)")
        );
        let low = at(2.0);
        assert!(low.contains(RiskFactor::LowActivity));
        assert!(!low.contains(RiskFactor::Sedentary));
        assert!(!at(2.5).contains(RiskFactor::LowActivity));
    }

    #[test]
    fn test_stress_bands() {
        let at = |s: u8| {
            RiskFactorExtractor::extract(&PatientRecord {
                stress_level: s,
                ..PatientRecord::example_record()
            })
        };
        assert!(at(9)
            .get(RiskFactor::Stress)
            .is_some_and(|e| e.description.starts_with("Extreme stress")));
        assert_eq!(at(10).get(RiskFactor::Stress).map(|e| e.severity), Some(Severity::Extreme));
        assert_eq!(at(8).get(RiskFactor::Stress).map(|e| e.severity), Some(Severity::Severe));
        assert!(at(8).is_at_least(RiskFactor::Stress, Severity::Severe));
        assert!(!at(7).is_at_least(RiskFactor::Stress, Severity::Severe));
        assert!(at(6).contains(RiskFactor::Stress));
        assert!(!at(5).contains(RiskFactor::Stress));
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let record = PatientRecord {
            smoking: Smoking::Former,
            ..PatientRecord::example_record()
        };
        let json = serde_json::to_string(&RiskFactorExtractor::extract(&record)).expect("json");
        let age = json.find("\"Age\"").expect("age key");
        let smoking = json.find("\"Smoking\"").expect("smoking key");
        let family = json.find("\"Family History\"").expect("family key");
        assert!(age < smoking && smoking < family);
    }
}
