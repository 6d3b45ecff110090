/// Negative log-likelihood loss for use with a LogSoftmax output layer.
pub struct NllLoss;

impl NllLoss {
    /// Computes the scalar NLL loss:
    ///   L = -sum(expected[i] * log_probs[i])
    ///
    /// `log_probs` — log-softmax outputs, shape [n_classes]
    /// `expected`  — one-hot (or soft) target distribution, shape [n_classes]
    pub fn loss(log_probs: &[f64], expected: &[f64]) -> f64 {
        log_probs.iter().zip(expected.iter())
            .map(|(lp, e)| -e * lp)
            .sum()
    }

    /// Gradient of the combined LogSoftmax + NLL w.r.t. the pre-log-softmax
    /// logits (i.e. the inputs to the LogSoftmax layer).
    ///
    /// When LogSoftmax and NLL are composed together the gradient simplifies
    /// to:
    ///   ∂L/∂z_i = exp(log_probs[i]) - expected[i]   (element-wise)
    ///
    /// This is the initial delta passed into the backward pass by the
    /// trainer. The LogSoftmax layer's own derivative step is identity (1.0)
    /// so the combined gradient is not double-applied.
    pub fn derivative(log_probs: &[f64], expected: &[f64]) -> Vec<f64> {
        log_probs.iter().zip(expected.iter())
            .map(|(lp, e)| lp.exp() - e)
            .collect()
    }
}
