//! Z-score standardization fitted on the training partition

use serde::{Deserialize, Serialize};

use crate::data::METRIC_COUNT;
use crate::{OffenseError, Result};

/// Per-feature mean and scale: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: Vec<f64>,
    /// Population standard deviation, 1 for constant features
    pub scale: Vec<f64>,
}

impl Standardizer {
    /// Compute from training rows
    pub fn fit(rows: &[[f64; METRIC_COUNT]]) -> Result<Self> {
        if rows.is_empty() {
            return Err(OffenseError::InsufficientData(
                "cannot fit standardization on zero rows".to_string(),
            ));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; METRIC_COUNT];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row.iter()) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; METRIC_COUNT];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row.iter()).zip(mean.iter()) {
                *v += (x - m) * (x - m);
            }
        }
        let scale = var
            .iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Standardizer { mean, scale })
    }

    pub fn transform(&self, row: &[f64; METRIC_COUNT]) -> [f64; METRIC_COUNT] {
        let mut out = [0.0; METRIC_COUNT];
        for (i, o) in out.iter_mut().enumerate() {
            *o = (row[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    pub fn transform_all(&self, rows: &[[f64; METRIC_COUNT]]) -> Vec<[f64; METRIC_COUNT]> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
