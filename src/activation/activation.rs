use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Tanh,
    Identity,
    /// LogSoftmax is a vector-valued activation; it is applied at the layer
    /// level (via `log_softmax()`), not element-wise. The element-wise
    /// `function()` method is therefore not used for this variant.
    LogSoftmax,
}

impl ActivationFunction {
    /// Element-wise activation. For `LogSoftmax`, the layer applies the
    /// full-vector `log_softmax()`; this path should not be reached.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Identity => x,
            ActivationFunction::LogSoftmax => {
                // Log-softmax cannot be applied element-wise; the layer handles it.
                panic!("ActivationFunction::LogSoftmax::function() must not be called directly; \
                        the layer applies the full-vector log_softmax()")
            }
        }
    }

    /// Element-wise derivative of the activation.
    ///
    /// For `LogSoftmax`, the layer pairs it with NLL loss and the combined
    /// gradient is `exp(log_probs) - expected` (already computed by
    /// `NllLoss::derivative()`). Returning `1.0` here lets the layer pass
    /// that delta through unchanged without double-applying the Jacobian.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Identity => 1.0,
            ActivationFunction::LogSoftmax => 1.0,
        }
    }
}

/// Numerically stable full-vector log-softmax:
///   log_softmax(z)_i = z_i - max(z) - ln(Σ exp(z_j - max(z)))
pub fn log_softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let log_sum = z.iter().map(|&v| (v - max).exp()).sum::<f64>().ln();
    z.iter().map(|&v| v - max - log_sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_clamps_negatives() {
        let act = ActivationFunction::ReLU;
        assert_eq!(act.function(-1.5), 0.0);
        assert_eq!(act.function(2.0), 2.0);
        assert_eq!(act.derivative(-1.5), 0.0);
        assert_eq!(act.derivative(2.0), 1.0);
    }

    #[test]
    fn sigmoid_is_symmetric_around_half() {
        let act = ActivationFunction::Sigmoid;
        assert!((act.function(0.0) - 0.5).abs() < 1e-12);
        assert!((act.function(3.0) + act.function(-3.0) - 1.0).abs() < 1e-12);
        // Derivative peaks at 0.25 in the middle.
        assert!((act.derivative(0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn log_softmax_exponentiates_to_a_distribution() {
        let logp = log_softmax(&[1.0, 2.0, 3.0]);
        let sum: f64 = logp.iter().map(|&v| v.exp()).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        // Larger logits get larger log-probabilities.
        assert!(logp[2] > logp[1] && logp[1] > logp[0]);
    }

    #[test]
    fn log_softmax_is_stable_for_large_logits() {
        let logp = log_softmax(&[1000.0, 1000.0]);
        assert!((logp[0] - (0.5f64).ln()).abs() < 1e-9);
        assert!(logp.iter().all(|v| v.is_finite()));
    }
}
