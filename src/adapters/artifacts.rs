//! Model artifact loading.
//!
//! A model directory holds three JSON artifacts exported by the training
//! pipeline plus an optional `manifest.json` binding them by SHA-256:
//!
//! - `encoding.json`: categorical tables and feature layout
//! - `scaler.json`: standard scaler parameters
//! - `classifier.json`: random forest or logistic regression
//!
//! Everything is validated here, once, so that a loaded [`ModelArtifacts`]
//! can serve any number of requests without re-checking dimensions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::forest::RandomForest;
use super::logistic::LogisticRegression;
use super::scaler::StandardScaler;
use crate::domain::{EncodingCatalog, EncodingError};
use crate::ports::{ModelError, RiskClassifier};

pub const ENCODING_FILE: &str = "encoding.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const ARTIFACT_FILES: [&str; 3] = [ENCODING_FILE, SCALER_FILE, CLASSIFIER_FILE];

/// Errors raised while loading the model directory.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest.json is required but missing from {0:?}")]
    ManifestMissing(PathBuf),

    #[error("Unsupported manifest version: {0}")]
    ManifestVersion(u32),

    #[error("manifest.json must include {0}")]
    ManifestIncomplete(&'static str),

    #[error("manifest.json references an invalid file name: {0}")]
    ManifestPath(String),

    #[error("File hash mismatch for {0}")]
    HashMismatch(String),

    #[error("Inconsistent artifacts: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ArtifactManifest {
    version: u32,
    files: BTreeMap<String, String>,
}

/// The trained classifier, whichever kind was exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl ClassifierModel {
    fn inner(&self) -> &dyn RiskClassifier {
        match self {
            Self::RandomForest(m) => m,
            Self::LogisticRegression(m) => m,
        }
    }
}

impl RiskClassifier for ClassifierModel {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict(&self, features: &[f64]) -> Result<u8, ModelError> {
        self.inner().predict(features)
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.inner().predict_probability(features)
    }

    fn estimator_probabilities(&self, features: &[f64]) -> Result<Option<Vec<f64>>, ModelError> {
        self.inner().estimator_probabilities(features)
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }
}

/// All three artifacts, loaded and cross-checked.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub catalog: EncodingCatalog,
    pub scaler: StandardScaler,
    pub classifier: ClassifierModel,
    /// Whether a manifest bound the files that were loaded
    pub verified: bool,
}

impl ModelArtifacts {
    /// Load and validate the artifacts in `model_dir`.
    ///
    /// When `manifest.json` exists every file it lists is hashed and
    /// compared. Without one, loading proceeds with a warning unless
    /// `require_manifest` is set.
    ///
    /// # Errors
    /// Returns `ArtifactError` for unreadable, malformed, unverified or
    /// mutually inconsistent artifacts.
    pub fn load(model_dir: &Path, require_manifest: bool) -> Result<Self, ArtifactError> {
        // Each file is read once; the bytes that are hashed are the bytes parsed.
        let encoding = read_bytes(&model_dir.join(ENCODING_FILE))?;
        let scaler = read_bytes(&model_dir.join(SCALER_FILE))?;
        let classifier = read_bytes(&model_dir.join(CLASSIFIER_FILE))?;
        let loaded = [
            (ENCODING_FILE, encoding.as_slice()),
            (SCALER_FILE, scaler.as_slice()),
            (CLASSIFIER_FILE, classifier.as_slice()),
        ];
        let verified = verify_manifest(model_dir, &loaded, require_manifest)?;

        let catalog: EncodingCatalog = parse_json(&model_dir.join(ENCODING_FILE), &encoding)?;
        let scaler: StandardScaler = parse_json(&model_dir.join(SCALER_FILE), &scaler)?;
        let classifier: ClassifierModel =
            parse_json(&model_dir.join(CLASSIFIER_FILE), &classifier)?;

        let artifacts = Self {
            catalog,
            scaler,
            classifier,
            verified,
        };
        artifacts.cross_check()?;

        tracing::info!(
            "Loaded model artifacts from {:?} (classifier={}, n_features={}, verified={})",
            model_dir,
            artifacts.classifier.describe(),
            artifacts.classifier.n_features(),
            verified
        );
        Ok(artifacts)
    }

    fn cross_check(&self) -> Result<(), ArtifactError> {
        self.catalog.validate()?;

        let n_catalog = self.catalog.features.len();
        let n_model = self.classifier.n_features();
        if n_catalog != n_model {
            return Err(ArtifactError::Inconsistent(format!(
                "encoding lists {n_catalog} features, classifier expects {n_model}"
            )));
        }

        let n_scaled = self.catalog.scaler_features.len();
        if self.scaler.len() != n_scaled {
            return Err(ArtifactError::Inconsistent(format!(
                "encoding lists {n_scaled} scaler features, scaler has {}",
                self.scaler.len()
            )));
        }
        Ok(())
    }
}

/// Hash the three artifacts in `model_dir` and write `manifest.json`.
///
/// # Errors
/// Returns `ArtifactError::Io` if an artifact cannot be read or the
/// manifest cannot be written.
pub fn write_manifest(model_dir: &Path) -> Result<PathBuf, ArtifactError> {
    let mut files = BTreeMap::new();
    for name in ARTIFACT_FILES {
        let bytes = read_bytes(&model_dir.join(name))?;
        files.insert(name.to_string(), sha256_hex_bytes(&bytes));
    }

    let manifest = ArtifactManifest { version: 1, files };
    let manifest_path = model_dir.join(MANIFEST_FILE);
    let bytes = serde_json::to_vec_pretty(&manifest).map_err(|source| ArtifactError::Json {
        path: manifest_path.clone(),
        source,
    })?;
    fs::write(&manifest_path, bytes).map_err(|source| ArtifactError::Io {
        path: manifest_path.clone(),
        source,
    })?;
    Ok(manifest_path)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Manifest entries must name files directly inside the model directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Check `loaded` (file name, contents already in memory) and any other
/// listed file against the manifest.
fn verify_manifest(
    model_dir: &Path,
    loaded: &[(&str, &[u8])],
    require_manifest: bool,
) -> Result<bool, ArtifactError> {
    let manifest_path = model_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        if require_manifest {
            return Err(ArtifactError::ManifestMissing(model_dir.to_path_buf()));
        }
        tracing::warn!(
            "No {} in {:?}; loading unverified model artifacts",
            MANIFEST_FILE,
            model_dir
        );
        return Ok(false);
    }

    let manifest: ArtifactManifest = parse_json(&manifest_path, &read_bytes(&manifest_path)?)?;
    if manifest.version != 1 {
        return Err(ArtifactError::ManifestVersion(manifest.version));
    }
    if let Some(missing) = ARTIFACT_FILES
        .iter()
        .copied()
        .find(|name| !manifest.files.contains_key(*name))
    {
        return Err(ArtifactError::ManifestIncomplete(missing));
    }

    for (rel, expected_hex) in &manifest.files {
        if !is_plain_file_name(rel) {
            return Err(ArtifactError::ManifestPath(rel.clone()));
        }
        let actual_hex = match loaded.iter().find(|(name, _)| *name == rel.as_str()) {
            Some((_, bytes)) => sha256_hex_bytes(bytes),
            None => sha256_hex_bytes(&read_bytes(&model_dir.join(rel))?),
        };
        if !constant_time_eq_str(&actual_hex, &expected_hex.to_ascii_lowercase()) {
            return Err(ArtifactError::HashMismatch(rel.clone()));
        }
    }

    tracing::debug!(files = manifest.files.len(), "Manifest verified");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::encoding::tests::standard_catalog;

    const FOREST: &str = r#"{
        "kind": "random_forest",
        "n_features": 9,
        "trees": [
            {"nodes": [
                {"feature": 0, "threshold": 0.0, "left": 1, "right": 2},
                {"probability": 0.2},
                {"probability": 0.6}
            ]},
            {"nodes": [{"probability": 0.4}]}
        ]
    }"#;

    const SCALER: &str = r#"{"mean": [50.0, 5.0, 5.5], "scale": [15.0, 3.0, 2.5]}"#;

    fn write_dir(classifier: &str, scaler: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = serde_json::to_string(&standard_catalog()).expect("catalog json");
        fs::write(dir.path().join(ENCODING_FILE), catalog).expect("write encoding");
        fs::write(dir.path().join(SCALER_FILE), scaler).expect("write scaler");
        fs::write(dir.path().join(CLASSIFIER_FILE), classifier).expect("write classifier");
        dir
    }

    fn tamper_manifest(dir: &Path) {
        let path = dir.join(MANIFEST_FILE);
        let mut manifest: ArtifactManifest =
            serde_json::from_slice(&fs::read(&path).expect("read manifest")).expect("parse");
        manifest
            .files
            .insert(SCALER_FILE.to_string(), sha256_hex_bytes(b"something else"));
        fs::write(&path, serde_json::to_vec(&manifest).expect("manifest json"))
            .expect("write manifest");
    }

    #[test]
    fn test_load_forest_without_manifest() {
        let dir = write_dir(FOREST, SCALER);
        let artifacts = ModelArtifacts::load(dir.path(), false).expect("load");

        assert!(!artifacts.verified);
        assert_eq!(artifacts.classifier.n_features(), 9);
        assert!(matches!(artifacts.classifier, ClassifierModel::RandomForest(_)));
    }

    #[test]
    fn test_load_logistic() {
        let logistic = r#"{"kind": "logistic_regression",
            "coefficients": [0.1, 0.2, -0.3, 0.1, -0.2, 0.4, 0.3, 0.3, 0.2],
            "intercept": -0.5}"#;
        let dir = write_dir(logistic, SCALER);
        let artifacts = ModelArtifacts::load(dir.path(), false).expect("load");
        assert!(matches!(artifacts.classifier, ClassifierModel::LogisticRegression(_)));
    }

    #[test]
    fn test_manifest_required() {
        let dir = write_dir(FOREST, SCALER);
        let err = ModelArtifacts::load(dir.path(), true).expect_err("manifest missing");
        assert!(matches!(err, ArtifactError::ManifestMissing(_)));

        let path = write_manifest(dir.path()).expect("write manifest");
        assert_eq!(path, dir.path().join(MANIFEST_FILE));
        let artifacts = ModelArtifacts::load(dir.path(), true).expect("load");
        assert!(artifacts.verified);
    }

    #[test]
    fn test_manifest_hash_mismatch() {
        let dir = write_dir(FOREST, SCALER);
        write_manifest(dir.path()).expect("write manifest");
        tamper_manifest(dir.path());
        let err = ModelArtifacts::load(dir.path(), false).expect_err("tampered");
        assert!(matches!(err, ArtifactError::HashMismatch(ref f) if f == SCALER_FILE));
    }

    #[test]
    fn test_manifest_hashes_the_bytes_that_are_parsed() {
        let dir = write_dir(FOREST, SCALER);
        write_manifest(dir.path()).expect("write manifest");
        let on_disk = fs::read(dir.path().join(SCALER_FILE)).expect("read scaler");

        let matching = [(SCALER_FILE, on_disk.as_slice())];
        assert!(verify_manifest(dir.path(), &matching, true).expect("verify"));

        // The files on disk still match; the copy in memory does not.
        let swapped = br#"{"mean": [0.0, 0.0, 0.0], "scale": [1.0, 1.0, 1.0]}"#;
        let loaded = [(SCALER_FILE, swapped.as_slice())];
        let err = verify_manifest(dir.path(), &loaded, true).expect_err("swapped");
        assert!(matches!(err, ArtifactError::HashMismatch(ref f) if f == SCALER_FILE));
    }

    #[test]
    fn test_manifest_must_list_all_artifacts() {
        let dir = write_dir(FOREST, SCALER);
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"version": 1, "files": {}}"#,
        )
        .expect("write manifest");
        let err = ModelArtifacts::load(dir.path(), false).expect_err("incomplete");
        assert!(matches!(err, ArtifactError::ManifestIncomplete(ENCODING_FILE)));
    }

    #[test]
    fn test_rejects_path_outside_model_dir() {
        assert!(is_plain_file_name("scaler.json"));
        assert!(!is_plain_file_name("../scaler.json"));
        assert!(!is_plain_file_name(".."));
    }

    #[test]
    fn test_dimension_cross_checks() {
        let narrow_forest = FOREST.replace("\"n_features\": 9", "\"n_features\": 4");
        let dir = write_dir(&narrow_forest, SCALER);
        let err = ModelArtifacts::load(dir.path(), false).expect_err("feature mismatch");
        assert!(matches!(err, ArtifactError::Inconsistent(_)));

        let dir = write_dir(FOREST, r#"{"mean": [1.0], "scale": [1.0]}"#);
        let err = ModelArtifacts::load(dir.path(), false).expect_err("scaler mismatch");
        assert!(matches!(err, ArtifactError::Inconsistent(_)));
    }

    #[test]
    fn test_malformed_artifacts() {
        let dir = write_dir(r#"{"kind": "svm"}"#, SCALER);
        let err = ModelArtifacts::load(dir.path(), false).expect_err("unknown kind");
        assert!(matches!(err, ArtifactError::Json { .. }));

        let empty = tempfile::tempdir().expect("tempdir");
        let err = ModelArtifacts::load(empty.path(), false).expect_err("missing files");
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
