//! Trained-classifier scoring.
//!
//! The classifier is an opaque, versioned artifact produced offline. This
//! module only loads and evaluates it; it never fits or mutates one.
//!
//! # Artifact format
//! A JSON document bundling the ordered feature list with a tree ensemble:
//!
//! ```json
//! {
//!   "version": "rf-2025-07",
//!   "features": ["lag_1", "sum_3d"],
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 1, "threshold": 50.0, "left": 1, "right": 2 },
//!         { "leaf": 0.05 },
//!         { "leaf": 0.92 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A split sends a row left when `row[feature] <= threshold`. A leaf holds
//! the class-1 probability. The ensemble probability is the mean over trees.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::analysis::features::{self, FeatureVector};
use crate::model::{ConfigError, EngineError, RiskScore, ScorerVariant};
use crate::scoring::{RiskScorer, ScoringContext};

/// A fitted binary classifier over a fixed, ordered feature list.
pub trait Classifier: Send + Sync {
    fn version(&self) -> &str;

    /// Feature names in the order `predict_proba` expects them.
    fn feature_names(&self) -> &[String];

    /// Probability of the flood class for one row.
    fn predict_proba(&self, row: &[f64]) -> f64;

    /// Predicted class for one row.
    fn predict(&self, row: &[f64]) -> bool {
        self.predict_proba(row) > 0.5
    }
}

// ---------------------------------------------------------------------------
// Tree ensemble artifact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walks from the root to a leaf. Validation guarantees every child
    /// index is greater than its parent, so the walk terminates.
    fn leaf_value(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn validate(&self, tree_idx: usize, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {} has no nodes", tree_idx));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { leaf } => {
                    if !(0.0..=1.0).contains(leaf) {
                        return Err(format!(
                            "tree {} node {}: leaf probability {} outside [0, 1]",
                            tree_idx, i, leaf
                        ));
                    }
                }
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= feature_count {
                        return Err(format!(
                            "tree {} node {}: feature index {} out of range",
                            tree_idx, i, feature
                        ));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!(
                                "tree {} node {}: invalid child index {}",
                                tree_idx, i, child
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Tree-ensemble classifier loaded from a JSON artifact.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForestArtifact {
    #[serde(default)]
    pub version: String,
    pub features: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

impl ForestArtifact {
    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, ConfigError> {
        let artifact: ForestArtifact =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        artifact.validate().map_err(ConfigError::Invalid)?;
        Ok(artifact)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: origin.clone(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json, &origin)
    }

    /// Checks the artifact against the features this service can produce
    /// and the structural rules of the tree format.
    pub fn validate(&self) -> Result<(), String> {
        if self.features.is_empty() {
            return Err("artifact lists no features".to_string());
        }
        if let Some(unknown) = self.features.iter().find(|f| !features::is_known_feature(f)) {
            return Err(format!("artifact expects unknown feature '{}'", unknown));
        }
        if self.trees.is_empty() {
            return Err("artifact contains no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.features.len())?;
        }
        Ok(())
    }
}

impl Classifier for ForestArtifact {
    fn version(&self) -> &str {
        &self.version
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.leaf_value(row)).sum();
        total / self.trees.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Model scorer
// ---------------------------------------------------------------------------

/// Scores feature vectors with the loaded classifier.
///
/// If the artifact failed to load, the scorer stays unavailable for the
/// life of the process and every request returns `ModelUnavailable`.
#[derive(Clone)]
pub struct ModelScorer {
    model: Result<Arc<dyn Classifier>, String>,
}

impl std::fmt::Debug for ModelScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.model {
            Ok(model) => write!(f, "ModelScorer(version={:?})", model.version()),
            Err(reason) => write!(f, "ModelScorer(unavailable: {})", reason),
        }
    }
}

impl ModelScorer {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        ModelScorer { model: Ok(model) }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelScorer {
            model: Err(reason.into()),
        }
    }

    /// Loads the artifact at `path`. A load failure produces an unavailable
    /// scorer rather than an error, so the threshold path keeps working.
    pub fn load(path: &Path) -> Self {
        match ForestArtifact::load(path) {
            Ok(artifact) => Self::new(Arc::new(artifact)),
            Err(e) => Self::unavailable(e.to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_ok()
    }

    pub fn version(&self) -> Option<&str> {
        self.model.as_ref().ok().map(|m| m.version())
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.model.as_ref().err().map(String::as_str)
    }

    pub fn score_features(&self, features: &FeatureVector) -> Result<RiskScore, EngineError> {
        let model = self
            .model
            .as_ref()
            .map_err(|reason| EngineError::ModelUnavailable(reason.clone()))?;
        let row = features.select(model.feature_names())?;
        Ok(RiskScore {
            risk: model.predict_proba(&row),
            flood: model.predict(&row),
        })
    }
}

impl RiskScorer for ModelScorer {
    fn variant(&self) -> ScorerVariant {
        ScorerVariant::Model
    }

    fn score(&self, ctx: &ScoringContext<'_>) -> Result<RiskScore, EngineError> {
        let fv = features::build(ctx.history, ctx.now);
        self.score_features(&fv)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
