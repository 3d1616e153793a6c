//! Patient record types for cardiovascular risk estimation.
//!
//! Requests arrive as a loosely typed [`PatientInput`] and are validated into
//! an immutable [`PatientRecord`] before anything downstream sees them.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Inclusive age range accepted at the boundary.
pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 18..=100;

/// Inclusive weekly exercise range (hours).
pub const EXERCISE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=24.0;

/// Inclusive self-reported stress range.
pub const STRESS_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Smoking {
    Never,
    Former,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlcoholIntake {
    None,
    Light,
    Moderate,
    Heavy,
}

/// Answer to a yes/no questionnaire item (diabetes, family history, obesity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl Gender {
    /// Label used by the questionnaire and the encoding catalog.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            _ => None,
        }
    }
}

impl Smoking {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "Never",
            Self::Former => "Former",
            Self::Current => "Current",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "Never" => Some(Self::Never),
            "Former" => Some(Self::Former),
            "Current" => Some(Self::Current),
            _ => None,
        }
    }
}

impl AlcoholIntake {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Light => "Light",
            Self::Moderate => "Moderate",
            Self::Heavy => "Heavy",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "None" => Some(Self::None),
            "Light" => Some(Self::Light),
            "Moderate" => Some(Self::Moderate),
            "Heavy" => Some(Self::Heavy),
            _ => None,
        }
    }
}

impl YesNo {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    #[must_use]
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "Yes" => Some(Self::Yes),
            "No" => Some(Self::No),
            _ => None,
        }
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors found in one request.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{} invalid field(s): {}", .0.len(), join_errors(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raw questionnaire payload as received from a caller.
///
/// Categorical answers are plain strings here so that unknown values become
/// structured validation errors instead of opaque deserialization failures.
/// Integer fields also accept whole-number floats (`45.0`); fractional values
/// and numeric strings are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInput {
    #[serde(deserialize_with = "whole_number")]
    pub age: i64,
    pub gender: String,
    pub smoking: String,
    pub alcohol_intake: String,
    pub exercise_hours: f64,
    pub diabetes: String,
    pub family_history: String,
    pub obesity: String,
    #[serde(deserialize_with = "whole_number")]
    pub stress_level: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonNumber {
    Int(i64),
    Float(f64),
}

fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match JsonNumber::deserialize(deserializer)? {
        JsonNumber::Int(v) => Ok(v),
        JsonNumber::Float(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        JsonNumber::Float(v) => Err(D::Error::custom(format!("expected a whole number, got {v}"))),
    }
}

/// Validated, immutable patient record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatientRecord {
    /// Age in years (18-100)
    pub age: u8,
    pub gender: Gender,
    pub smoking: Smoking,
    pub alcohol_intake: AlcoholIntake,
    /// Weekly exercise in hours (0-24)
    pub exercise_hours: f64,
    pub diabetes: YesNo,
    pub family_history: YesNo,
    pub obesity: YesNo,
    /// Self-reported stress (1-10)
    pub stress_level: u8,
}

impl PatientInput {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    /// Returns every out-of-range number and unrecognized categorical value.
    pub fn validate(&self) -> Result<PatientRecord, ValidationErrors> {
        let mut errors = Vec::new();

        if !AGE_RANGE.contains(&self.age) {
            errors.push(ValidationError {
                field: "age",
                message: format!(
                    "{} out of range [{}, {}]",
                    self.age,
                    AGE_RANGE.start(),
                    AGE_RANGE.end()
                ),
            });
        }
        if !self.exercise_hours.is_finite() || !EXERCISE_RANGE.contains(&self.exercise_hours) {
            errors.push(ValidationError {
                field: "exercise_hours",
                message: format!("{} out of range [0, 24]", self.exercise_hours),
            });
        }
        if !STRESS_RANGE.contains(&self.stress_level) {
            errors.push(ValidationError {
                field: "stress_level",
                message: format!("{} out of range [1, 10]", self.stress_level),
            });
        }

        let gender = categorical(&mut errors, "gender", &self.gender, Gender::parse, "Male, Female");
        let smoking = categorical(
            &mut errors,
            "smoking",
            &self.smoking,
            Smoking::parse,
            "Never, Former, Current",
        );
        let alcohol_intake = categorical(
            &mut errors,
            "alcohol_intake",
            &self.alcohol_intake,
            AlcoholIntake::parse,
            "None, Light, Moderate, Heavy",
        );
        let diabetes = categorical(&mut errors, "diabetes", &self.diabetes, YesNo::parse, "Yes, No");
        let family_history = categorical(
            &mut errors,
            "family_history",
            &self.family_history,
            YesNo::parse,
            "Yes, No",
        );
        let obesity = categorical(&mut errors, "obesity", &self.obesity, YesNo::parse, "Yes, No");

        match (gender, smoking, alcohol_intake, diabetes, family_history, obesity) {
            (
                Some(gender),
                Some(smoking),
                Some(alcohol_intake),
                Some(diabetes),
                Some(family_history),
                Some(obesity),
            ) if errors.is_empty() => Ok(PatientRecord {
                // Ranges were checked above.
                age: self.age as u8,
                gender,
                smoking,
                alcohol_intake,
                exercise_hours: self.exercise_hours,
                diabetes,
                family_history,
                obesity,
                stress_level: self.stress_level as u8,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn categorical<T>(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    parse: fn(&str) -> Option<T>,
    allowed: &str,
) -> Option<T> {
    let parsed = parse(value);
    if parsed.is_none() {
        errors.push(ValidationError {
            field,
            message: format!("'{value}' is not one of: {allowed}"),
        });
    }
    parsed
}

impl TryFrom<PatientInput> for PatientRecord {
    type Error = ValidationErrors;

    fn try_from(input: PatientInput) -> Result<Self, Self::Error> {
        input.validate()
    }
}

impl From<&PatientRecord> for PatientInput {
    fn from(record: &PatientRecord) -> Self {
        Self {
            age: i64::from(record.age),
            gender: record.gender.as_str().to_string(),
            smoking: record.smoking.as_str().to_string(),
            alcohol_intake: record.alcohol_intake.as_str().to_string(),
            exercise_hours: record.exercise_hours,
            diabetes: record.diabetes.as_str().to_string(),
            family_history: record.family_history.as_str().to_string(),
            obesity: record.obesity.as_str().to_string(),
            stress_level: i64::from(record.stress_level),
        }
    }
}

impl PatientRecord {
    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    #[must_use]
    pub fn is_male(&self) -> bool {
        self.gender == Gender::Male
    }

    #[must_use]
    pub fn is_current_smoker(&self) -> bool {
        self.smoking == Smoking::Current
    }

    #[must_use]
    pub fn never_smoked(&self) -> bool {
        self.smoking == Smoking::Never
    }

    #[must_use]
    pub fn is_diabetic(&self) -> bool {
        self.diabetes.is_yes()
    }

    #[must_use]
    pub fn is_obese(&self) -> bool {
        self.obesity.is_yes()
    }

    #[must_use]
    pub fn has_family_history(&self) -> bool {
        self.family_history.is_yes()
    }

    #[must_use]
    pub fn drinks_heavily(&self) -> bool {
        self.alcohol_intake == AlcoholIntake::Heavy
    }

    /// Under one hour of exercise per week.
    #[must_use]
    pub fn is_sedentary(&self) -> bool {
        self.exercise_hours < 1.0
    }

    #[must_use]
    pub fn high_stress(&self) -> bool {
        self.stress_level >= 8
    }

    /// The questionnaire's documented example (55-year-old man).
    #[must_use]
    pub fn example_record() -> Self {
        Self {
            age: 55,
            gender: Gender::Male,
            smoking: Smoking::Never,
            alcohol_intake: AlcoholIntake::Moderate,
            exercise_hours: 3.5,
            diabetes: YesNo::No,
            family_history: YesNo::Yes,
            obesity: YesNo::No,
            stress_level: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with_age(age: i64) -> PatientInput {
        let mut input = PatientInput::from(&PatientRecord::example_record());
        input.age = age;
        input
    }

    #[test]
    fn test_age_boundaries() {
        assert!(input_with_age(17).validate().is_err());
        assert!(input_with_age(101).validate().is_err());
        assert_eq!(input_with_age(18).validate().expect("18 is valid").age, 18);
        assert_eq!(input_with_age(100).validate().expect("100 is valid").age, 100);
    }

    #[test]
    fn test_unknown_categorical_is_rejected() {
        let mut input = input_with_age(40);
        input.gender = "Other".to_string();
        input.smoking = "Sometimes".to_string();

        let errors = input.validate().expect_err("should reject");
        let fields: Vec<_> = errors.0.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["gender", "smoking"]);
    }

    #[test]
    fn test_numeric_ranges_collect_all_errors() {
        let mut input = input_with_age(150);
        input.exercise_hours = 25.0;
        input.stress_level = 0;

        let errors = input.validate().expect_err("should reject");
        assert_eq!(errors.0.len(), 3);
        assert!(errors.to_string().contains("age"));
    }

    #[test]
    fn test_non_finite_exercise_rejected() {
        let mut input = input_with_age(40);
        input.exercise_hours = f64::NAN;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "age": 55, "gender": "Male", "smoking": "Never",
            "alcohol_intake": "Moderate", "exercise_hours": 3.5,
            "diabetes": "No", "family_history": "Yes", "obesity": "No",
            "stress_level": 6
        }"#;
        let input: PatientInput = serde_json::from_str(json).expect("valid json");
        let record = PatientRecord::try_from(input).expect("valid record");
        assert_eq!(record, PatientRecord::example_record());
    }

    #[test]
    fn test_integer_fields_accept_whole_floats() {
        let json = |age: &str, stress: &str| {
            format!(
                r#"{{"age": {age}, "gender": "Male", "smoking": "Never",
                "alcohol_intake": "Moderate", "exercise_hours": 3.5,
                "diabetes": "No", "family_history": "Yes", "obesity": "No",
                "stress_level": {stress}}}"#
            )
        };
        let input: PatientInput = serde_json::from_str(&json("55.0", "6.0")).expect("whole floats");
        assert_eq!(input.age, 55);
        assert_eq!(input.stress_level, 6);

        assert!(serde_json::from_str::<PatientInput>(&json("55.5", "6")).is_err());
        assert!(serde_json::from_str::<PatientInput>(&json("55", "\"6\"")).is_err());
    }

    #[test]
    fn test_predicates() {
        let record = PatientRecord {
            smoking: Smoking::Current,
            exercise_hours: 0.5,
            stress_level: 8,
            ..PatientRecord::example_record()
        };
        assert!(record.is_current_smoker());
        assert!(record.is_sedentary());
        assert!(record.high_stress());
        assert!(record.has_family_history());
        assert!(!record.is_diabetic());
    }
}
