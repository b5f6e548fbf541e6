//! Classifier Models
//!
//! Fitted parameters are stored in the artifact and evaluated here. Every
//! model predicts an encoded class code; decoding happens in the engine.

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fitted classifier
pub trait Classifier: Send + Sync {
    /// Width of the rows the model was fitted on
    fn n_features(&self) -> usize;

    /// Check the fitted parameters for internal consistency
    fn validate(&self) -> Result<(), InferenceError>;

    /// Predict the encoded class of one row of the right width
    fn predict_one(&self, row: &[f64]) -> Result<i64, InferenceError>;

    /// Predict encoded classes for a batch of rows
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, InferenceError> {
        rows.iter()
            .map(|row| {
                if row.len() != self.n_features() {
                    return Err(InferenceError::InvalidInputShape {
                        expected: self.n_features(),
                        actual: row.len(),
                    });
                }
                self.predict_one(row)
            })
            .collect()
    }
}

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `row[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { class: i64 },
}

/// Decision tree stored as a flat node array, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

impl Classifier for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn validate(&self) -> Result<(), InferenceError> {
        if self.nodes.is_empty() {
            return Err(InferenceError::InvalidArtifact("decision tree has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= self.n_features {
                    return Err(InferenceError::InvalidArtifact(format!(
                        "node {} splits on feature {} but the tree has {} features",
                        i, feature, self.n_features
                    )));
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(InferenceError::InvalidArtifact(format!(
                        "node {} has a child outside the {} nodes",
                        i,
                        self.nodes.len()
                    )));
                }
            }
        }
        Ok(())
    }

    fn predict_one(&self, row: &[f64]) -> Result<i64, InferenceError> {
        let mut index = 0;
        // A path longer than the node count can only be a cycle
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { class }) => return Ok(*class),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().ok_or_else(|| {
                        InferenceError::InferenceFailed(format!("feature {} out of range", feature))
                    })?;
                    index = if value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(InferenceError::InferenceFailed(format!(
                        "tree node {} does not exist",
                        index
                    )))
                }
            }
        }
        Err(InferenceError::InferenceFailed("decision tree contains a cycle".to_string()))
    }
}

/// Majority vote over decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn validate(&self) -> Result<(), InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::InvalidArtifact("random forest has no trees".to_string()));
        }
        for tree in &self.trees {
            if tree.n_features > self.n_features {
                return Err(InferenceError::InvalidArtifact(format!(
                    "tree expects {} features but the forest has {}",
                    tree.n_features, self.n_features
                )));
            }
            tree.validate()?;
        }
        Ok(())
    }

    /// Ties go to the smallest class code
    fn predict_one(&self, row: &[f64]) -> Result<i64, InferenceError> {
        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict_one(row)?).or_default() += 1;
        }

        let mut best: Option<(i64, usize)> = None;
        for (class, count) in votes {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((class, count));
            }
        }
        best.map(|(class, _)| class)
            .ok_or_else(|| InferenceError::InferenceFailed("random forest cast no votes".to_string()))
    }
}

/// Linear model: one coefficient row per class, or a single row for binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<i64>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LogisticRegression {
    fn score(&self, k: usize, row: &[f64]) -> f64 {
        let dot: f64 = self.coefficients[k].iter().zip(row).map(|(w, x)| w * x).sum();
        dot + self.intercepts[k]
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn validate(&self) -> Result<(), InferenceError> {
        let rows = self.coefficients.len();
        if rows == 0 {
            return Err(InferenceError::InvalidArtifact(
                "logistic regression has no coefficients".to_string(),
            ));
        }
        let width = self.n_features();
        if self.coefficients.iter().any(|c| c.len() != width) {
            return Err(InferenceError::InvalidArtifact(
                "logistic regression coefficient rows differ in width".to_string(),
            ));
        }
        if self.intercepts.len() != rows {
            return Err(InferenceError::InvalidArtifact(format!(
                "{} intercepts for {} coefficient rows",
                self.intercepts.len(),
                rows
            )));
        }
        let expected_classes = if rows == 1 { 2 } else { rows };
        if self.classes.len() != expected_classes {
            return Err(InferenceError::InvalidArtifact(format!(
                "expected {} classes, found {}",
                expected_classes,
                self.classes.len()
            )));
        }
        Ok(())
    }

    fn predict_one(&self, row: &[f64]) -> Result<i64, InferenceError> {
        if self.coefficients.len() == 1 {
            let class = if self.score(0, row) > 0.0 { 1 } else { 0 };
            return Ok(self.classes[class]);
        }

        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for k in 0..self.coefficients.len() {
            let score = self.score(k, row);
            if score > best_score {
                best = k;
                best_score = score;
            }
        }
        Ok(self.classes[best])
    }
}

/// Any classifier the artifact can carry, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierModel {
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl ClassifierModel {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierModel::DecisionTree(_) => "decision_tree",
            ClassifierModel::RandomForest(_) => "random_forest",
            ClassifierModel::LogisticRegression(_) => "logistic_regression",
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            ClassifierModel::DecisionTree(m) => m,
            ClassifierModel::RandomForest(m) => m,
            ClassifierModel::LogisticRegression(m) => m,
        }
    }
}

impl Classifier for ClassifierModel {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn validate(&self) -> Result<(), InferenceError> {
        self.inner().validate()
    }

    fn predict_one(&self, row: &[f64]) -> Result<i64, InferenceError> {
        self.inner().predict_one(row)
    }
}
