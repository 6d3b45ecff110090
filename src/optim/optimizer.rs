use crate::network::network::Network;
use crate::optim::adam::Adam;
use crate::optim::sgd::Sgd;

/// The optimizers the training loop can drive. Both consume the gradients
/// accumulated in the network's layers; the update sequence per batch is
/// `zero_grad` → forward/loss/backward → `step`.
pub enum Optimizer {
    Sgd(Sgd),
    Adam(Adam),
}

impl Optimizer {
    pub fn sgd(learning_rate: f64) -> Optimizer {
        Optimizer::Sgd(Sgd::new(learning_rate))
    }

    pub fn adam(learning_rate: f64) -> Optimizer {
        Optimizer::Adam(Adam::new(learning_rate))
    }

    pub fn learning_rate(&self) -> f64 {
        match self {
            Optimizer::Sgd(o) => o.learning_rate,
            Optimizer::Adam(o) => o.learning_rate,
        }
    }

    /// Resets the gradient accumulators of every layer.
    pub fn zero_grad(&self, network: &mut Network) {
        network.zero_grad();
    }

    /// Updates all network parameters from their accumulated gradients.
    pub fn step(&mut self, network: &mut Network) {
        let mut views = network.param_views();
        match self {
            Optimizer::Sgd(o) => o.step(&mut views),
            Optimizer::Adam(o) => o.step(&mut views),
        }
    }
}
