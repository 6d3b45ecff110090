use serde::{Serialize, Deserialize};

use crate::loss::mse::MseLoss;
use crate::loss::nll::NllLoss;

/// Selects which loss function the training loop uses.
///
/// - `Nll` — negative log-likelihood; pair with a LogSoftmax output layer.
///   The gradient is the combined LogSoftmax+NLL gradient
///   (exp(log_probs) - expected), matching the convention in
///   `NllLoss::derivative()`.
/// - `Mse` — mean-squared error; pair with Identity or Sigmoid output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Nll,
    Mse,
}

impl LossType {
    /// Scalar loss for one sample.
    pub fn loss(&self, predicted: &[f64], expected: &[f64]) -> f64 {
        match self {
            LossType::Nll => NllLoss::loss(predicted, expected),
            LossType::Mse => MseLoss::loss(predicted, expected),
        }
    }

    /// Per-output gradient for one sample; the initial delta fed into the
    /// backward pass.
    pub fn derivative(&self, predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        match self {
            LossType::Nll => NllLoss::derivative(predicted, expected),
            LossType::Mse => MseLoss::derivative(predicted, expected),
        }
    }
}
