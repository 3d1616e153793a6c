//! Feature encoding: patient record to the classifier's numeric feature space.
//!
//! The catalog's declared feature order drives the output layout. Nothing at
//! runtime can tell whether that order matches what the classifier was
//! trained on, so the catalog and classifier must always ship together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::patient::{AlcoholIntake, PatientRecord};
use crate::ports::{ModelError, Scaler};

/// Fixed ordinal code for alcohol intake.
///
/// Kept apart from the catalog tables on purpose: the catalog never carried
/// an alcohol table and the classifier was trained on these codes.
pub const ALCOHOL_ORDINAL: [(AlcoholIntake, f64); 4] = [
    (AlcoholIntake::None, 0.0),
    (AlcoholIntake::Light, 1.0),
    (AlcoholIntake::Moderate, 2.0),
    (AlcoholIntake::Heavy, 3.0),
];

#[must_use]
pub fn alcohol_code(intake: AlcoholIntake) -> f64 {
    ALCOHOL_ORDINAL
        .iter()
        .find(|(level, _)| *level == intake)
        .map_or(0.0, |(_, code)| *code)
}

/// Record field a catalog feature is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Age,
    Gender,
    Smoking,
    AlcoholIntake,
    ExerciseHours,
    Diabetes,
    FamilyHistory,
    Obesity,
    StressLevel,
}

impl RecordField {
    /// Translate a catalog feature name (e.g. `"Family History"`).
    ///
    /// Unknown display names fall back to their snake_case form, so
    /// `"stress_level"` resolves as well as `"Stress Level"`.
    #[must_use]
    pub fn from_feature_name(name: &str) -> Option<Self> {
        let field = match name {
            "Age" => Self::Age,
            "Gender" => Self::Gender,
            "Smoking" => Self::Smoking,
            "Alcohol Intake" => Self::AlcoholIntake,
            "Exercise Hours" => Self::ExerciseHours,
            "Diabetes" => Self::Diabetes,
            "Family History" => Self::FamilyHistory,
            "Obesity" => Self::Obesity,
            "Stress Level" => Self::StressLevel,
            other => return Self::from_snake_case(&other.to_lowercase().replace(' ', "_")),
        };
        Some(field)
    }

    fn from_snake_case(key: &str) -> Option<Self> {
        match key {
            "age" => Some(Self::Age),
            "gender" => Some(Self::Gender),
            "smoking" => Some(Self::Smoking),
            "alcohol_intake" => Some(Self::AlcoholIntake),
            "exercise_hours" => Some(Self::ExerciseHours),
            "diabetes" => Some(Self::Diabetes),
            "family_history" => Some(Self::FamilyHistory),
            "obesity" => Some(Self::Obesity),
            "stress_level" => Some(Self::StressLevel),
            _ => None,
        }
    }

    /// Record field name, as used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Smoking => "smoking",
            Self::AlcoholIntake => "alcohol_intake",
            Self::ExerciseHours => "exercise_hours",
            Self::Diabetes => "diabetes",
            Self::FamilyHistory => "family_history",
            Self::Obesity => "obesity",
            Self::StressLevel => "stress_level",
        }
    }

    /// Whether the value is looked up in a catalog table.
    #[must_use]
    pub fn uses_catalog_table(&self) -> bool {
        matches!(
            self,
            Self::Gender | Self::Smoking | Self::Diabetes | Self::FamilyHistory | Self::Obesity
        )
    }
}

/// Errors raised while building a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodingError {
    #[error("Catalog feature '{0}' does not map to any patient field")]
    UnknownFeature(String),

    #[error("No encoding table for feature '{feature}' (field {field})")]
    MissingTable { feature: String, field: &'static str },

    #[error("Value '{value}' of field {field} has no code in the catalog")]
    UnknownValue { field: &'static str, value: String },

    #[error("Scaler feature '{0}' is not part of the feature list")]
    UnknownScalerFeature(String),

    #[error("Scaler rejected input: {0}")]
    Scaler(#[from] ModelError),
}

/// Categorical code tables plus the classifier's feature layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingCatalog {
    /// Catalog feature name -> (category label -> numeric code)
    pub encodings: BTreeMap<String, BTreeMap<String, f64>>,

    /// Ordered feature names expected by the classifier
    pub features: Vec<String>,

    /// Subset of `features` that must pass through the scaler
    pub scaler_features: Vec<String>,
}

impl EncodingCatalog {
    /// Check that every feature resolves and every table the encoder will
    /// need is present. Run once at load time.
    ///
    /// # Errors
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), EncodingError> {
        for feature in &self.features {
            let field = RecordField::from_feature_name(feature)
                .ok_or_else(|| EncodingError::UnknownFeature(feature.clone()))?;
            if field.uses_catalog_table() && !self.encodings.contains_key(feature) {
                return Err(EncodingError::MissingTable {
                    feature: feature.clone(),
                    field: field.name(),
                });
            }
        }
        self.scaler_indices().map(|_| ())
    }

    /// Positions of the scaler features inside `features`, in scaler order.
    ///
    /// # Errors
    /// Returns `UnknownScalerFeature` for a name missing from `features`.
    pub fn scaler_indices(&self) -> Result<Vec<usize>, EncodingError> {
        self.scaler_features
            .iter()
            .map(|name| {
                self.features
                    .iter()
                    .position(|f| f == name)
                    .ok_or_else(|| EncodingError::UnknownScalerFeature(name.clone()))
            })
            .collect()
    }

    fn lookup(&self, feature: &str, field: RecordField, label: &str) -> Result<f64, EncodingError> {
        let table = self
            .encodings
            .get(feature)
            .ok_or_else(|| EncodingError::MissingTable {
                feature: feature.to_string(),
                field: field.name(),
            })?;
        table
            .get(label)
            .copied()
            .ok_or_else(|| EncodingError::UnknownValue {
                field: field.name(),
                value: label.to_string(),
            })
    }
}

/// Ordered numeric input for the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatureVector(Vec<f64>);

impl EncodedFeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maps patient records into the catalog's feature space.
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Encode a record: categorical lookup, catalog ordering, then scaling of
    /// the catalog's normalized subset. Other positions pass through.
    ///
    /// # Errors
    /// Returns `EncodingError` naming the offending feature or field.
    pub fn encode<S: Scaler + ?Sized>(
        record: &PatientRecord,
        catalog: &EncodingCatalog,
        scaler: &S,
    ) -> Result<EncodedFeatureVector, EncodingError> {
        let mut raw = Vec::with_capacity(catalog.features.len());
        for feature in &catalog.features {
            let field = RecordField::from_feature_name(feature)
                .ok_or_else(|| EncodingError::UnknownFeature(feature.clone()))?;
            raw.push(Self::field_value(record, catalog, feature, field)?);
        }

        let indices = catalog.scaler_indices()?;
        if !indices.is_empty() {
            let subset: Vec<f64> = indices.iter().map(|&i| raw[i]).collect();
            let scaled = scaler.transform(&subset)?;
            if scaled.len() != indices.len() {
                return Err(EncodingError::Scaler(ModelError::DimensionMismatch {
                    expected: indices.len(),
                    got: scaled.len(),
                }));
            }
            for (&i, value) in indices.iter().zip(scaled) {
                raw[i] = value;
            }
        }

        tracing::trace!(features = raw.len(), "Encoded feature vector");
        Ok(EncodedFeatureVector(raw))
    }

    fn field_value(
        record: &PatientRecord,
        catalog: &EncodingCatalog,
        feature: &str,
        field: RecordField,
    ) -> Result<f64, EncodingError> {
        let value = match field {
            RecordField::Age => f64::from(record.age),
            RecordField::ExerciseHours => record.exercise_hours,
            RecordField::StressLevel => f64::from(record.stress_level),
            RecordField::AlcoholIntake => alcohol_code(record.alcohol_intake),
            RecordField::Gender => catalog.lookup(feature, field, record.gender.as_str())?,
            RecordField::Smoking => catalog.lookup(feature, field, record.smoking.as_str())?,
            RecordField::Diabetes => catalog.lookup(feature, field, record.diabetes.as_str())?,
            RecordField::FamilyHistory => {
                catalog.lookup(feature, field, record.family_history.as_str())?
            }
            RecordField::Obesity => catalog.lookup(feature, field, record.obesity.as_str())?,
        };
        Ok(value)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::patient::{Gender, Smoking, YesNo};

    /// Catalog laid out like the training pipeline's export.
    pub(crate) fn standard_catalog() -> EncodingCatalog {
        let yes_no: BTreeMap<String, f64> =
            [("No".to_string(), 0.0), ("Yes".to_string(), 1.0)].into_iter().collect();
        let mut encodings = BTreeMap::new();
        encodings.insert(
            "Gender".to_string(),
            [("Female".to_string(), 0.0), ("Male".to_string(), 1.0)]
                .into_iter()
                .collect(),
        );
        encodings.insert(
            "Smoking".to_string(),
            [
                ("Current".to_string(), 0.0),
                ("Former".to_string(), 1.0),
                ("Never".to_string(), 2.0),
            ]
            .into_iter()
            .collect(),
        );
        encodings.insert("Diabetes".to_string(), yes_no.clone());
        encodings.insert("Family History".to_string(), yes_no.clone());
        encodings.insert("Obesity".to_string(), yes_no);

        EncodingCatalog {
            encodings,
            features: [
                "Age",
                "Gender",
                "Smoking",
                "Alcohol Intake",
                "Exercise Hours",
                "Diabetes",
                "Family History",
                "Obesity",
                "Stress Level",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            scaler_features: ["Age", "Exercise Hours", "Stress Level"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Scaler that doubles every value, so scaled positions are visible.
    pub(crate) struct DoublingScaler;

    impl Scaler for DoublingScaler {
        fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError> {
            Ok(values.iter().map(|v| v * 2.0).collect())
        }
    }

    #[test]
    fn test_encode_follows_catalog_order_and_scales_subset() {
        let record = PatientRecord::example_record();
        let vector = FeatureEncoder::encode(&record, &standard_catalog(), &DoublingScaler)
            .expect("should encode");

        // Age, Gender, Smoking, Alcohol, Exercise, Diabetes, FamHist, Obesity, Stress
        assert_eq!(
            vector.as_slice(),
            &[110.0, 1.0, 2.0, 2.0, 7.0, 0.0, 1.0, 0.0, 12.0]
        );
    }

    #[test]
    fn test_reordered_catalog_reorders_vector() {
        let mut catalog = standard_catalog();
        catalog.features.reverse();
        catalog.scaler_features.clear();

        let record = PatientRecord {
            gender: Gender::Female,
            smoking: Smoking::Current,
            diabetes: YesNo::Yes,
            ..PatientRecord::example_record()
        };
        let vector =
            FeatureEncoder::encode(&record, &catalog, &DoublingScaler).expect("should encode");
        assert_eq!(
            vector.as_slice(),
            &[6.0, 0.0, 1.0, 1.0, 3.5, 2.0, 0.0, 0.0, 55.0]
        );
    }

    #[test]
    fn test_alcohol_uses_fixed_ordinal() {
        assert!((alcohol_code(AlcoholIntake::None) - 0.0).abs() < f64::EPSILON);
        assert!((alcohol_code(AlcoholIntake::Heavy) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snake_case_feature_names_resolve() {
        assert_eq!(
            RecordField::from_feature_name("stress_level"),
            Some(RecordField::StressLevel)
        );
        assert_eq!(
            RecordField::from_feature_name("Exercise Hours"),
            Some(RecordField::ExerciseHours)
        );
        assert_eq!(RecordField::from_feature_name("Cholesterol"), None);
    }

    #[test]
    fn test_missing_code_names_field() {
        let mut catalog = standard_catalog();
        if let Some(table) = catalog.encodings.get_mut("Smoking") {
            table.remove("Never");
        }
        let err = FeatureEncoder::encode(&PatientRecord::example_record(), &catalog, &DoublingScaler)
            .expect_err("should fail");
        assert_eq!(
            err,
            EncodingError::UnknownValue {
                field: "smoking",
                value: "Never".to_string()
            }
        );
    }

    #[test]
    fn test_validate_catches_bad_catalogs() {
        assert!(standard_catalog().validate().is_ok());

        let mut missing_table = standard_catalog();
        missing_table.encodings.remove("Obesity");
        assert!(matches!(
            missing_table.validate(),
            Err(EncodingError::MissingTable { field: "obesity", .. })
        ));

        let mut bad_scaler = standard_catalog();
        bad_scaler.scaler_features.push("BMI".to_string());
        assert!(matches!(
            bad_scaler.validate(),
            Err(EncodingError::UnknownFeature(_)) | Err(EncodingError::UnknownScalerFeature(_))
        ));
    }
}
