//! Standardization and L2-regularized logistic regression.

use serde::{Deserialize, Serialize};

/// Per-column standardization fitted on the training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations. Constant columns
    /// get a scale of 1 so they transform to zero.
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], dimension: usize) -> Self {
        let mut mean = vec![0.0; dimension];
        let mut scale = vec![1.0; dimension];
        if rows.is_empty() {
            return Self { mean, scale };
        }

        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }

        let mut variance = vec![0.0; dimension];
        for row in rows {
            for ((var, v), m) in variance.iter_mut().zip(row).zip(&mean) {
                *var += (v - m).powi(2) / n;
            }
        }

        for (s, var) in scale.iter_mut().zip(&variance) {
            let std = var.sqrt();
            if std > f64::EPSILON {
                *s = std;
            }
        }

        Self { mean, scale }
    }

    #[must_use]
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

/// Gradient-descent settings. Stored in the model for reproducibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub learning_rate: f64,
    pub iterations: usize,
    pub l2_penalty: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            iterations: 1000,
            l2_penalty: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticRegression {
    /// Batch gradient descent from all-zero weights, so a given training set
    /// always produces the same model.
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], labels: &[bool], dimension: usize, params: TrainingParams) -> Self {
        let mut weights = vec![0.0; dimension];
        let mut bias = 0.0;
        if rows.is_empty() {
            return Self { weights, bias };
        }

        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;

        for _ in 0..params.iterations {
            let mut grad_w = vec![0.0; dimension];
            let mut grad_b = 0.0;

            for (row, label) in rows.iter().zip(labels) {
                let target = if *label { 1.0 } else { 0.0 };
                let err = sigmoid(dot(&weights, row) + bias) - target;
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += err * x;
                }
                grad_b += err;
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * (g / n + params.l2_penalty * *w);
            }
            bias -= params.learning_rate * grad_b / n;
        }

        Self { weights, bias }
    }

    /// Probability of the positive class, in `[0, 1]`.
    #[must_use]
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(dot(&self.weights, row) + self.bias)
    }
}

/// Holdout metrics recorded at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub holdout_size: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

impl Evaluation {
    /// Metrics over paired predictions and labels. Precision and recall are 0
    /// when their denominators are empty.
    #[must_use]
    pub fn compute(predictions: &[bool], labels: &[bool]) -> Self {
        let mut tp = 0_u32;
        let mut fp = 0_u32;
        let mut fn_ = 0_u32;
        let mut correct = 0_u32;
        for (p, l) in predictions.iter().zip(labels) {
            match (p, l) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
                (false, false) => {}
            }
            if p == l {
                correct += 1;
            }
        }

        let ratio = |num: u32, den: u32| {
            if den == 0 {
                0.0
            } else {
                f64::from(num) / f64::from(den)
            }
        };
        let holdout_size = predictions.len().min(labels.len());
        let total = u32::try_from(holdout_size).unwrap_or(u32::MAX);

        Self {
            holdout_size,
            accuracy: ratio(correct, total),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
