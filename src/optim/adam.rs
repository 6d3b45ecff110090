use crate::layers::ParamView;

/// First/second moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
struct Moment {
    m: Vec<f64>,
    v: Vec<f64>,
}

/// Adam optimizer with bias-corrected moment estimates.
///
/// Moment buffers are allocated lazily on the first `step()` to match the
/// network's parameter tensors, and re-allocated if the tensor layout ever
/// changes. Gradients are read, never modified; zeroing them between batches
/// is the training loop's job.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    /// 1-based timestep used for bias correction.
    step_count: i32,
    moments: Vec<Moment>,
}

impl Adam {
    /// Standard hyperparameters: beta1 = 0.9, beta2 = 0.999, eps = 1e-8.
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            step_count: 0,
            moments: Vec::new(),
        }
    }

    /// Applies one Adam update to every parameter tensor:
    ///   m = β1·m + (1-β1)·g
    ///   v = β2·v + (1-β2)·g²
    ///   θ -= lr · m̂ / (√v̂ + ε)     with m̂ = m/(1-β1^t), v̂ = v/(1-β2^t)
    pub fn step(&mut self, params: &mut [ParamView<'_>]) {
        self.step_count += 1;

        if self.moments.len() != params.len() {
            self.moments = params
                .iter()
                .map(|p| Moment {
                    m: vec![0.0; p.values.len()],
                    v: vec![0.0; p.values.len()],
                })
                .collect();
        }

        let bias1 = 1.0 - self.beta1.powi(self.step_count);
        let bias2 = 1.0 - self.beta2.powi(self.step_count);

        for (view, moment) in params.iter_mut().zip(self.moments.iter_mut()) {
            if moment.m.len() != view.values.len() {
                moment.m = vec![0.0; view.values.len()];
                moment.v = vec![0.0; view.values.len()];
            }
            for (i, (value, &grad)) in view.values.iter_mut().zip(view.grads.iter()).enumerate() {
                moment.m[i] = self.beta1 * moment.m[i] + (1.0 - self.beta1) * grad;
                moment.v[i] = self.beta2 * moment.v[i] + (1.0 - self.beta2) * grad * grad;

                let m_hat = moment.m[i] / bias1;
                let v_hat = moment.v[i] / bias2;

                *value -= self.learning_rate * m_hat / (v_hat.sqrt() + self.eps);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimizes f(x) = Σ (x_i - target_i)²; the gradient is 2(x - target).
    #[test]
    fn converges_on_a_quadratic_bowl() {
        let target = [3.0, -1.5, 0.25];
        let mut values = vec![0.0; 3];
        let mut adam = Adam::new(0.1);

        for _ in 0..500 {
            let mut grads: Vec<f64> = values
                .iter()
                .zip(target.iter())
                .map(|(x, t)| 2.0 * (x - t))
                .collect();
            let mut views = vec![ParamView { values: &mut values, grads: &mut grads }];
            adam.step(&mut views);
        }

        for (x, t) in values.iter().zip(target.iter()) {
            assert!((x - t).abs() < 0.01, "did not converge: {x} vs {t}");
        }
    }

    #[test]
    fn first_step_moves_by_roughly_the_learning_rate() {
        // With bias correction the very first update is ≈ lr · sign(g).
        let mut values = vec![0.0];
        let mut grads = vec![4.0];
        let mut adam = Adam::new(0.001);
        let mut views = vec![ParamView { values: &mut values, grads: &mut grads }];
        adam.step(&mut views);
        assert!((values[0] + 0.001).abs() < 1e-6, "got {}", values[0]);
    }
}
