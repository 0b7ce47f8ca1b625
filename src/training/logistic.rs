//! Logistic regression trained as a single linear layer

use burn::nn::{Initializer, Linear, LinearConfig};
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use serde::{Deserialize, Serialize};

use crate::data::METRIC_COUNT;
use crate::{OffenseError, Result, TrainingConfig};

/// Fitted weights, detached from the training backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// One weight per standardized feature
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Training loss after the last epoch
    pub final_loss: f64,
}

impl LogisticModel {
    pub fn decision(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// Probability that Team A is preferred
    pub fn probability(&self, row: &[f64]) -> f64 {
        1.0 / (1.0 + (-self.decision(row)).exp())
    }

    /// 1 for Team A when the decision value is positive
    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.decision(row) > 0.0)
    }
}

/// Full-batch gradient descent on L2-regularised binary cross-entropy
pub struct LogisticTrainer<B: AutodiffBackend> {
    learning_rate: f64,
    epochs: usize,
    l2: f64,
    seed: u64,
    device: B::Device,
}

impl<B: AutodiffBackend> LogisticTrainer<B> {
    pub fn new(device: B::Device, config: &TrainingConfig) -> Self {
        LogisticTrainer {
            learning_rate: config.learning_rate,
            epochs: config.epochs,
            l2: config.l2,
            seed: config.seed,
            device,
        }
    }

    /// Train on standardized rows and 0/1 targets
    pub fn fit(&self, rows: &[[f64; METRIC_COUNT]], targets: &[u8]) -> Result<LogisticModel> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(OffenseError::InsufficientData(format!(
                "{} feature rows for {} targets",
                rows.len(),
                targets.len()
            )));
        }
        B::seed(self.seed);

        let x = feature_tensor::<B>(rows, &self.device);
        let y = label_tensor::<B>(targets, &self.device);

        // Zero start keeps every run identical
        let mut model: Linear<B> = LinearConfig::new(METRIC_COUNT, 1)
            .with_initializer(Initializer::Zeros)
            .init(&self.device);
        let mut optimizer = SgdConfig::new().init::<B, Linear<B>>();

        // sklearn's objective divided by n*C; the intercept is not penalised
        let penalty = self.l2 / (2.0 * rows.len() as f64);

        log::info!(
            "Training logistic regression on {} rows for {} epochs",
            rows.len(),
            self.epochs
        );

        let mut loss_val = 0.0f32;
        for epoch in 0..self.epochs {
            let probs = sigmoid(model.forward(x.clone()));
            let data_loss = binary_cross_entropy(probs, y.clone());
            let weight_loss = model
                .weight
                .val()
                .powf_scalar(2.0)
                .sum()
                .mul_scalar(penalty);
            let loss = data_loss + weight_loss;
            loss_val = loss.clone().into_scalar().elem();

            let grads = loss.backward();
            let grads_params = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(self.learning_rate, model, grads_params);

            if epoch % 100 == 0 || epoch + 1 == self.epochs {
                log::debug!("Epoch {}/{}: loss={:.4}", epoch + 1, self.epochs, loss_val);
            }
        }

        let coefficients = tensor_values(model.weight.val())?;
        let intercept = match &model.bias {
            Some(bias) => tensor_values(bias.val())?.first().copied().unwrap_or(0.0),
            None => 0.0,
        };

        Ok(LogisticModel {
            coefficients,
            intercept,
            final_loss: loss_val as f64,
        })
    }
}

fn feature_tensor<B: Backend>(rows: &[[f64; METRIC_COUNT]], device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = rows
        .iter()
        .flat_map(|r| r.iter().map(|v| *v as f32))
        .collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([rows.len(), METRIC_COUNT])
}

fn label_tensor<B: Backend>(targets: &[u8], device: &B::Device) -> Tensor<B, 2> {
    let labels: Vec<f32> = targets.iter().map(|t| *t as f32).collect();
    Tensor::<B, 1>::from_floats(labels.as_slice(), device).reshape([targets.len(), 1])
}

fn binary_cross_entropy<B: Backend>(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs_clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs_clamped.clone().log()
        - (targets.neg() + 1.0) * (probs_clamped.neg() + 1.0).log();
    loss.mean()
}

fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f64>> {
    let values: Vec<f32> = tensor
        .into_data()
        .to_vec()
        .map_err(|e| OffenseError::Model(format!("could not read weights: {:?}", e)))?;
    Ok(values.into_iter().map(f64::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn config() -> TrainingConfig {
        crate::Config::default().training
    }

    /// First feature decides the label, the rest is noise-free filler
    fn separable() -> (Vec<[f64; METRIC_COUNT]>, Vec<u8>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..20 {
            let mut row = [0.0; METRIC_COUNT];
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            row[0] = sign * (1.0 + (i as f64) / 10.0);
            row[1] = (i % 5) as f64 - 2.0;
            rows.push(row);
            targets.push(u8::from(sign > 0.0));
        }
        (rows, targets)
    }

    #[test]
    fn test_learns_separable_feature() {
        let (rows, targets) = separable();
        let trainer = LogisticTrainer::<TestBackend>::new(Default::default(), &config());
        let model = trainer.fit(&rows, &targets).unwrap();

        assert_eq!(model.coefficients.len(), METRIC_COUNT);
        assert!(model.coefficients[0] > 0.0);
        assert!(model.coefficients[0].abs() > model.coefficients[1].abs());

        let correct = rows
            .iter()
            .zip(&targets)
            .filter(|(r, t)| model.predict(&r[..]) == **t)
            .count();
        assert_eq!(correct, rows.len());
    }

    #[test]
    fn test_training_is_deterministic() {
        let (rows, targets) = separable();
        let first = LogisticTrainer::<TestBackend>::new(Default::default(), &config())
            .fit(&rows, &targets)
            .unwrap();
        let second = LogisticTrainer::<TestBackend>::new(Default::default(), &config())
            .fit(&rows, &targets)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_probability_matches_decision() {
        let model = LogisticModel {
            coefficients: vec![2.0, -1.0],
            intercept: 0.0,
            final_loss: 0.0,
        };
        assert_eq!(model.probability(&[0.0, 0.0]), 0.5);
        assert_eq!(model.predict(&[0.0, 0.0]), 0);
        assert!(model.probability(&[1.0, 0.0]) > 0.5);
        assert_eq!(model.predict(&[0.0, 1.0]), 0);
    }

    #[test]
    fn test_mismatched_rows() {
        let trainer = LogisticTrainer::<TestBackend>::new(Default::default(), &config());
        assert!(trainer.fit(&[[0.0; METRIC_COUNT]], &[]).is_err());
    }
}
