//! Adapter around the pre-trained fraud model.
//!
//! The model is exported ahead of time to a JSON artifact carrying the
//! feature names it was trained on and the fitted parameters. It is loaded
//! once at startup and shared read-only for the life of the process.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{ClaimFeatures, FEATURE_COUNT, FEATURE_NAMES, Label};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model was trained on features {found:?}, expected {expected:?}", expected = FEATURE_NAMES)]
    SchemaMismatch { found: Vec<String> },

    #[error("logistic regression has {found} coefficients, expected {expected}", expected = FEATURE_COUNT)]
    CoefficientCount { found: usize },

    #[error("model parameter `{0}` is not finite")]
    NonFinite(String),

    #[error("decision tree has no nodes")]
    EmptyTree,

    #[error("decision tree node {index} is invalid: {reason}")]
    InvalidNode { index: usize, reason: String },
}

/// Raw inference over a feature vector in [`FEATURE_NAMES`] order.
pub trait FraudModel: Send + Sync + fmt::Debug {
    fn predict_raw(&self, features: &[f64; FEATURE_COUNT]) -> i64;
}

/// On-disk form of the exported model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub model: ModelSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
}

/// Binary logistic regression; class 1 when the decision function is
/// strictly positive.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::CoefficientCount {
                found: self.coefficients.len(),
            });
        }
        if let Some(i) = self.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite(format!("coefficients[{i}]")));
        }
        if !self.intercept.is_finite() {
            return Err(ModelError::NonFinite("intercept".to_string()));
        }
        Ok(())
    }

    pub fn decision_function(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

impl FraudModel for LogisticRegression {
    fn predict_raw(&self, features: &[f64; FEATURE_COUNT]) -> i64 {
        i64::from(self.decision_function(features) > 0.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `features[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: i64,
    },
}

/// Flat decision tree rooted at node 0. Children always sit after their
/// parent, which makes every walk terminate.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::EmptyTree);
        }
        let len = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            else {
                continue;
            };
            let invalid = |reason: String| ModelError::InvalidNode { index, reason };
            if *feature >= FEATURE_COUNT {
                return Err(invalid(format!("feature index {feature} out of range")));
            }
            if !threshold.is_finite() {
                return Err(invalid("threshold is not finite".to_string()));
            }
            for child in [*left, *right] {
                if child <= index || child >= len {
                    return Err(invalid(format!("child {child} must point forward")));
                }
            }
        }
        Ok(())
    }
}

impl FraudModel for DecisionTree {
    fn predict_raw(&self, features: &[f64; FEATURE_COUNT]) -> i64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl ModelArtifact {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the artifact against the fixed schema and return the model.
    pub fn into_model(self) -> Result<Arc<dyn FraudModel>, ModelError> {
        if self.feature_names != FEATURE_NAMES {
            return Err(ModelError::SchemaMismatch {
                found: self.feature_names,
            });
        }
        Ok(match self.model {
            ModelSpec::LogisticRegression(model) => {
                model.validate()?;
                Arc::new(model)
            }
            ModelSpec::DecisionTree(model) => {
                model.validate()?;
                Arc::new(model)
            }
        })
    }
}

/// Maps model output onto [`Label`].
#[derive(Clone, Debug)]
pub struct Classifier {
    model: Arc<dyn FraudModel>,
}

impl Classifier {
    pub fn new(model: Arc<dyn FraudModel>) -> Self {
        Self { model }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = ModelArtifact::from_json(&json)?.into_model()?;
        info!(path = %path.display(), model = ?model, "fraud model loaded");
        Ok(Self::new(model))
    }

    pub fn predict(&self, features: &ClaimFeatures) -> Label {
        let raw = self.model.predict_raw(&features.to_vector());
        let label = Label::from_raw(raw);
        debug!(raw, %label, "claim classified");
        label
    }
}
