//! Model summary text and JSON artifact

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use super::logistic::LogisticModel;
use super::metrics::Evaluation;
use super::standardize::Standardizer;
use crate::data::ensure_parent;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCoefficient {
    pub feature: String,
    pub coef: f64,
}

/// Pair each feature with its weight, largest magnitude first
pub fn rank_coefficients(features: &[String], coefficients: &[f64]) -> Vec<RankedCoefficient> {
    let mut ranked: Vec<RankedCoefficient> = features
        .iter()
        .zip(coefficients.iter())
        .map(|(feature, &coef)| RankedCoefficient {
            feature: feature.clone(),
            coef,
        })
        .collect();
    ranked.sort_by(|a, b| b.coef.abs().total_cmp(&a.coef.abs()));
    ranked
}

/// Everything needed to reuse the fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub features: Vec<String>,
    pub standardizer: Standardizer,
    pub model: LogisticModel,
    pub evaluation: Evaluation,
    pub train_size: usize,
    pub test_size: usize,
    pub seed: u64,
}

impl ModelArtifact {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ensure_parent(&path)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub artifact: ModelArtifact,
    pub ranked: Vec<RankedCoefficient>,
}

impl ModelReport {
    pub fn new(artifact: ModelArtifact) -> Self {
        let ranked = rank_coefficients(&artifact.features, &artifact.model.coefficients);
        ModelReport { artifact, ranked }
    }

    pub fn accuracy(&self) -> f64 {
        self.artifact.evaluation.accuracy
    }

    /// Human-readable summary
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn save_summary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ensure_parent(&path)?;
        fs::write(path, self.render())?;
        Ok(())
    }

    pub fn save_artifact<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.artifact.save(path)
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eval = &self.artifact.evaluation;

        writeln!(f, "Offense Preference Model (Logistic Regression)")?;
        writeln!(f, "=================================================\n")?;
        writeln!(f, "Features used:")?;
        for feature in &self.artifact.features {
            writeln!(f, "  - {}", feature)?;
        }

        write!(f, "\nTest accuracy:\n  {:.3}\n\n", eval.accuracy)?;
        write!(
            f,
            "Confusion matrix (rows = true, cols = predicted):\n{}\n\n",
            eval.confusion
        )?;
        writeln!(f, "Classification report:\n{}", eval.classification_report())?;

        writeln!(f, "\nFeature coefficients:")?;
        writeln!(f, "  (Positive coef => higher value for Team A makes model more likely")?;
        writeln!(f, "   to choose Team A as better offense.)\n")?;
        for c in &self.ranked {
            writeln!(f, "  {}: {:.3}", c.feature, c.coef)?;
        }
        Ok(())
    }
}
