//! Personality code classifier over questionnaire answers.
//!
//! The model is a linear one-vs-rest classifier exported to
//! `classifier.json`:
//!
//! ```json
//! {
//!   "mapping": {"نعم": 1.0, "لا": 0.0},
//!   "feature_columns": ["Q1", "Q2"],
//!   "scaling": [{"column": "Q1", "mean": 0.5, "scale": 0.5}],
//!   "coefficients": [[0.4, -1.2], [-0.3, 0.9]],
//!   "intercepts": [0.1, -0.1],
//!   "classes": ["R-I-A", "S-E-C"]
//! }
//! ```
//!
//! Prediction maps each answer through `mapping` (unknown answers become 0),
//! lays the values out in `feature_columns` order (missing questions become 0),
//! standard-scales the `scaling` columns and picks the class with the largest
//! decision value. A binary model carries a single coefficient row, whose
//! positive side is `classes[1]`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const ARTIFACT_FILE_NAME: &str = "classifier.json";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier artifacts not found at {0}")]
    Missing(PathBuf),

    #[error("failed to read classifier artifacts: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse classifier artifacts: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid classifier artifacts: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledColumn {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifacts {
    pub mapping: HashMap<String, f64>,
    pub feature_columns: Vec<String>,
    #[serde(default)]
    pub scaling: Vec<ScaledColumn>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PersonalityClassifier {
    artifacts: ClassifierArtifacts,
    /// Feature index and (mean, scale) for each scaled column
    scaling: Vec<(usize, f64, f64)>,
}

impl PersonalityClassifier {
    /// Load `classifier.json` from `artifacts_dir`.
    pub fn load(artifacts_dir: &Path) -> Result<Self, ClassifierError> {
        let path = artifacts_dir.join(ARTIFACT_FILE_NAME);
        if !path.is_file() {
            return Err(ClassifierError::Missing(path));
        }
        let raw = std::fs::read(&path)?;
        let artifacts: ClassifierArtifacts = serde_json::from_slice(&raw)?;
        let classifier = Self::from_artifacts(artifacts)?;
        info!(
            "Loaded personality classifier ({} features, {} classes)",
            classifier.artifacts.feature_columns.len(),
            classifier.artifacts.classes.len()
        );
        Ok(classifier)
    }

    pub fn from_artifacts(artifacts: ClassifierArtifacts) -> Result<Self, ClassifierError> {
        let features = artifacts.feature_columns.len();
        let classes = artifacts.classes.len();
        if features == 0 {
            return Err(ClassifierError::Invalid("no feature columns".into()));
        }
        if classes < 2 {
            return Err(ClassifierError::Invalid(format!(
                "need at least 2 classes, got {classes}"
            )));
        }
        let rows = if classes == 2 { 1 } else { classes };
        let rows_ok = artifacts.coefficients.len() == rows
            || (classes == 2 && artifacts.coefficients.len() == 2);
        if !rows_ok || artifacts.intercepts.len() != artifacts.coefficients.len() {
            return Err(ClassifierError::Invalid(format!(
                "{} coefficient rows and {} intercepts for {} classes",
                artifacts.coefficients.len(),
                artifacts.intercepts.len(),
                classes
            )));
        }
        if let Some(row) = artifacts.coefficients.iter().find(|r| r.len() != features) {
            return Err(ClassifierError::Invalid(format!(
                "coefficient row has {} values for {} features",
                row.len(),
                features
            )));
        }

        let mut scaling = Vec::with_capacity(artifacts.scaling.len());
        for col in &artifacts.scaling {
            let index = artifacts
                .feature_columns
                .iter()
                .position(|c| c == &col.column)
                .ok_or_else(|| {
                    ClassifierError::Invalid(format!("scaling column {} is not a feature", col.column))
                })?;
            // a zero scale means a constant column; leave it centred only
            let scale = if col.scale == 0.0 { 1.0 } else { col.scale };
            scaling.push((index, col.mean, scale));
        }

        Ok(Self { artifacts, scaling })
    }

    pub fn classes(&self) -> &[String] {
        &self.artifacts.classes
    }

    /// Feature vector for `answers`, after mapping and scaling.
    pub fn features(&self, answers: &HashMap<String, String>) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .artifacts
            .feature_columns
            .iter()
            .map(|column| {
                answers
                    .get(column)
                    .and_then(|answer| self.artifacts.mapping.get(answer.trim()))
                    .copied()
                    .unwrap_or(0.0)
            })
            .collect();
        for &(index, mean, scale) in &self.scaling {
            values[index] = (values[index] - mean) / scale;
        }
        values
    }

    /// Predicted personality code for `answers`.
    pub fn predict(&self, answers: &HashMap<String, String>) -> &str {
        let features = self.features(answers);
        let decisions: Vec<f64> = self
            .artifacts
            .coefficients
            .iter()
            .zip(&self.artifacts.intercepts)
            .map(|(row, intercept)| {
                row.iter().zip(&features).map(|(w, x)| w * x).sum::<f64>() + intercept
            })
            .collect();
        debug!(?decisions, "Classifier decision values");

        let class = if decisions.len() == 1 {
            usize::from(decisions[0] > 0.0)
        } else {
            decisions
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, &d)| {
                    if d > best.1 { (i, d) } else { best }
                })
                .0
        };
        &self.artifacts.classes[class]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect()
    }

    fn three_class() -> ClassifierArtifacts {
        ClassifierArtifacts {
            mapping: HashMap::from([("نعم".to_string(), 1.0), ("لا".to_string(), 0.0)]),
            feature_columns: vec!["Q1".into(), "Q2".into(), "Q3".into()],
            scaling: vec![ScaledColumn {
                column: "Q3".into(),
                mean: 0.5,
                scale: 0.5,
            }],
            coefficients: vec![
                vec![2.0, 0.0, 0.0],
                vec![0.0, 2.0, 0.0],
                vec![0.0, 0.0, 2.0],
            ],
            intercepts: vec![0.0, 0.0, 0.0],
            classes: vec!["R-I-A".into(), "S-E-C".into(), "A-S-I".into()],
        }
    }

    #[test]
    fn test_features_map_reindex_and_scale() {
        let classifier = PersonalityClassifier::from_artifacts(three_class()).unwrap();
        let features = classifier.features(&answers(&[
            ("Q1", "نعم"),
            ("Q3", "ربما"),
            ("Q99", "نعم"),
        ]));
        // Q2 missing -> 0, Q3 unknown answer -> 0 then scaled (0 - 0.5) / 0.5
        assert_eq!(features, vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_predict_picks_largest_decision() {
        let classifier = PersonalityClassifier::from_artifacts(three_class()).unwrap();
        assert_eq!(classifier.predict(&answers(&[("Q1", "نعم")])), "R-I-A");
        assert_eq!(classifier.predict(&answers(&[("Q2", "نعم")])), "S-E-C");
        assert_eq!(
            classifier.predict(&answers(&[("Q3", "نعم")])),
            "A-S-I"
        );
    }

    #[test]
    fn test_binary_model_uses_sign() {
        let artifacts = ClassifierArtifacts {
            mapping: HashMap::from([("نعم".to_string(), 1.0)]),
            feature_columns: vec!["Q1".into()],
            scaling: vec![],
            coefficients: vec![vec![1.0]],
            intercepts: vec![-0.5],
            classes: vec!["C-R-I".into(), "E-S-A".into()],
        };
        let classifier = PersonalityClassifier::from_artifacts(artifacts).unwrap();
        assert_eq!(classifier.predict(&answers(&[("Q1", "نعم")])), "E-S-A");
        assert_eq!(classifier.predict(&answers(&[])), "C-R-I");
    }

    #[test]
    fn test_inconsistent_artifacts_are_rejected() {
        let mut artifacts = three_class();
        artifacts.intercepts.pop();
        assert!(matches!(
            PersonalityClassifier::from_artifacts(artifacts),
            Err(ClassifierError::Invalid(_))
        ));

        let mut artifacts = three_class();
        artifacts.scaling[0].column = "Q7".into();
        assert!(PersonalityClassifier::from_artifacts(artifacts).is_err());
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = tempdir().unwrap();
        assert!(matches!(
            PersonalityClassifier::load(temp_dir.path()),
            Err(ClassifierError::Missing(_))
        ));

        std::fs::write(
            temp_dir.path().join(ARTIFACT_FILE_NAME),
            serde_json::to_vec(&three_class()).unwrap(),
        )
        .unwrap();
        let classifier = PersonalityClassifier::load(temp_dir.path()).unwrap();
        assert_eq!(classifier.classes().len(), 3);
    }
}
