//! Random-forest classifier evaluated from an exported JSON tree dump.
//!
//! Each tree is a flat node array rooted at index 0. A split sends the
//! sample left when `x[feature] <= threshold`. Child indices always point
//! forward, so a walk visits at most `nodes.len()` nodes.

use serde::{Deserialize, Serialize};

use crate::ports::{check_features, ModelError, RiskClassifier};

/// One node of a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Positive-class probability at this leaf
        probability: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, tree_index: usize, n_features: usize) -> Result<(), ModelError> {
        let invalid = |msg: String| ModelError::InvalidArtifact(format!("tree {tree_index}: {msg}"));

        if self.nodes.is_empty() {
            return Err(invalid("no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(invalid(format!(
                            "node {i} splits on feature {feature}, model has {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(format!("node {i} has a non-finite threshold")));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(invalid(format!("node {i} has invalid child {child}")));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(&probability) {
                        return Err(invalid(format!(
                            "leaf {i} probability {probability} outside [0, 1]"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features
                        .get(*feature)
                        .ok_or(ModelError::DimensionMismatch {
                            expected: feature + 1,
                            got: features.len(),
                        })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::InvalidArtifact(format!(
                        "node index {index} out of range"
                    )))
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct RawForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

/// Validated forest. Construct with [`RandomForest::new`] or deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawForest")]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl TryFrom<RawForest> for RandomForest {
    type Error = ModelError;

    fn try_from(raw: RawForest) -> Result<Self, Self::Error> {
        Self::new(raw.n_features, raw.trees)
    }
}

impl RandomForest {
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` if any tree is malformed.
    pub fn new(n_features: usize, trees: Vec<DecisionTree>) -> Result<Self, ModelError> {
        if n_features == 0 {
            return Err(ModelError::InvalidArtifact("forest has zero features".into()));
        }
        if trees.is_empty() {
            return Err(ModelError::InvalidArtifact("forest has no trees".into()));
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(i, n_features)?;
        }
        Ok(Self { n_features, trees })
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn tree_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_features(features, self.n_features)?;
        self.trees.iter().map(|t| t.probability(features)).collect()
    }
}

impl RiskClassifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<u8, ModelError> {
        Ok(u8::from(self.predict_probability(features)? > 0.5))
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        let probs = self.tree_probabilities(features)?;
        Ok(probs.iter().sum::<f64>() / probs.len() as f64)
    }

    fn estimator_probabilities(&self, features: &[f64]) -> Result<Option<Vec<f64>>, ModelError> {
        self.tree_probabilities(features).map(Some)
    }

    fn describe(&self) -> String {
        format!("random_forest(trees={}, features={})", self.n_trees(), self.n_features)
    }
}
