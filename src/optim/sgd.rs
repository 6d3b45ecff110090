use crate::layers::ParamView;

/// Plain stochastic gradient descent.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update to every parameter tensor given its accumulated
    /// (already batch-averaged) gradients.
    pub fn step(&self, params: &mut [ParamView<'_>]) {
        for view in params.iter_mut() {
            for (value, &grad) in view.values.iter_mut().zip(view.grads.iter()) {
                *value -= self.learning_rate * grad;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_against_the_gradient() {
        let mut values = vec![1.0, -2.0];
        let mut grads = vec![0.5, -0.5];
        let mut views = vec![ParamView { values: &mut values, grads: &mut grads }];

        Sgd::new(0.1).step(&mut views);

        assert!((values[0] - 0.95).abs() < 1e-12);
        assert!((values[1] + 1.95).abs() < 1e-12);
    }
}
