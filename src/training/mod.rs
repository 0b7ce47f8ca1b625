//! Preference model training
//!
//! Stratified split, standardization, logistic regression, and evaluation.

pub mod logistic;
pub mod metrics;
pub mod report;
pub mod split;
pub mod standardize;

pub use logistic::{LogisticModel, LogisticTrainer};
pub use metrics::{ConfusionMatrix, Evaluation};
pub use report::{ModelArtifact, ModelReport, RankedCoefficient};
pub use split::{stratified_split, SplitIndices};
pub use standardize::Standardizer;

use burn::backend::{Autodiff, NdArray};
use burn::tensor::backend::AutodiffBackend;

use crate::data::METRIC_COUNT;
use crate::features::differential::feature_names;
use crate::features::TrainingTable;
use crate::{Result, TrainingConfig};

pub type DefaultBackend = Autodiff<NdArray<f32>>;

/// Surrogate model predicting the judge's preference from stat differences
pub struct PreferenceModel {
    config: TrainingConfig,
}

impl PreferenceModel {
    pub fn new(config: TrainingConfig) -> Self {
        PreferenceModel { config }
    }

    /// Split, fit on the training part, and score on the held-out part
    pub fn fit_evaluate<B: AutodiffBackend>(
        &self,
        table: &TrainingTable,
        device: B::Device,
    ) -> Result<ModelReport> {
        let targets = table.targets();
        let split = stratified_split(&targets, self.config.test_fraction, self.config.seed)?;

        let select = |indices: &[usize]| -> (Vec<[f64; METRIC_COUNT]>, Vec<u8>) {
            indices
                .iter()
                .map(|&i| (table.rows[i].diffs, table.rows[i].target))
                .unzip()
        };
        let (train_rows, train_targets) = select(&split.train);
        let (test_rows, test_targets) = select(&split.test);

        let standardizer = Standardizer::fit(&train_rows)?;
        let train_x = standardizer.transform_all(&train_rows);
        let test_x = standardizer.transform_all(&test_rows);

        let trainer = LogisticTrainer::<B>::new(device, &self.config);
        let model = trainer.fit(&train_x, &train_targets)?;

        let predicted: Vec<u8> = test_x.iter().map(|row| model.predict(row)).collect();
        let evaluation = Evaluation::new(&test_targets, &predicted);
        log::info!("Test {}", evaluation);

        Ok(ModelReport::new(ModelArtifact {
            features: feature_names(),
            standardizer,
            model,
            evaluation,
            train_size: split.train.len(),
            test_size: split.test.len(),
            seed: self.config.seed,
        }))
    }
}
