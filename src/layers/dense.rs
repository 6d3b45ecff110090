use serde::{Serialize, Deserialize};

use crate::activation::activation::{self, ActivationFunction};
use crate::math::matrix::Matrix;

/// Fully-connected layer: a = act(xW + b).
///
/// `forward()` caches the input and pre-activation values (z = xW + b) needed
/// for the derivative in `backward()`. Gradients accumulate across samples
/// until `zero_grad()`, so mini-batch averaging is the caller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub input_size: usize,
    pub size: usize,
    /// Weight matrix, (input_size × size).
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub activation: ActivationFunction,
    #[serde(skip)]
    input_cache: Vec<f64>,
    #[serde(skip)]
    pre_activation: Vec<f64>,
    #[serde(skip)]
    weight_grads: Vec<f64>,
    #[serde(skip)]
    bias_grads: Vec<f64>,
}

impl DenseLayer {
    /// He init before ReLU, Xavier for all other activations. Biases start
    /// at zero.
    pub fn new(input_size: usize, size: usize, activation: ActivationFunction) -> DenseLayer {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, size, input_size),
            _ => Matrix::xavier(input_size, size, input_size),
        };
        DenseLayer {
            input_size,
            size,
            weights,
            biases: vec![0.0; size],
            activation,
            input_cache: Vec::new(),
            pre_activation: Vec::new(),
            weight_grads: vec![0.0; input_size * size],
            bias_grads: vec![0.0; size],
        }
    }

    pub fn output_len(&self) -> usize {
        self.size
    }

    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.input_size);

        let mut z = self.biases.clone();
        for (i, &x) in input.iter().enumerate() {
            for j in 0..self.size {
                z[j] += x * self.weights.at(i, j);
            }
        }

        let a = match self.activation {
            ActivationFunction::LogSoftmax => activation::log_softmax(&z),
            act => z.iter().map(|&v| act.function(v)).collect(),
        };

        self.input_cache = input.to_vec();
        self.pre_activation = z;
        a
    }

    /// Consumes ∂L/∂a for this layer, accumulates weight/bias gradients, and
    /// returns ∂L/∂a for the previous layer.
    ///
    /// Must follow a `forward()` on the same sample. For `LogSoftmax` the
    /// incoming delta is already the combined LogSoftmax+NLL gradient, so the
    /// derivative step passes it through unchanged.
    pub fn backward(&mut self, delta: &[f64]) -> Vec<f64> {
        debug_assert_eq!(delta.len(), self.size);
        debug_assert_eq!(self.input_cache.len(), self.input_size, "backward without forward");
        self.ensure_grads();

        // δ = ∂L/∂a ⊙ act'(z)
        let dz: Vec<f64> = delta
            .iter()
            .zip(self.pre_activation.iter())
            .map(|(&d, &z)| d * self.activation.derivative(z))
            .collect();

        for (i, &x) in self.input_cache.iter().enumerate() {
            for (j, &d) in dz.iter().enumerate() {
                self.weight_grads[i * self.size + j] += x * d;
            }
        }
        for (j, &d) in dz.iter().enumerate() {
            self.bias_grads[j] += d;
        }

        // Propagate δ through the weights to get ∂L/∂a for the layer below.
        let mut prev = vec![0.0; self.input_size];
        for (i, p) in prev.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (j, &d) in dz.iter().enumerate() {
                acc += self.weights.at(i, j) * d;
            }
            *p = acc;
        }
        prev
    }

    pub fn zero_grad(&mut self) {
        self.weight_grads.clear();
        self.weight_grads.resize(self.weights.len(), 0.0);
        self.bias_grads.clear();
        self.bias_grads.resize(self.biases.len(), 0.0);
    }

    pub fn param_views(&mut self) -> Vec<super::ParamView<'_>> {
        vec![
            super::ParamView {
                values: &mut self.weights.data,
                grads: &mut self.weight_grads,
            },
            super::ParamView {
                values: &mut self.biases,
                grads: &mut self.bias_grads,
            },
        ]
    }

    // Gradient buffers are skipped by serde; restore them after a load.
    fn ensure_grads(&mut self) {
        if self.weight_grads.len() != self.weights.len() {
            self.weight_grads = vec![0.0; self.weights.len()];
        }
        if self.bias_grads.len() != self.biases.len() {
            self.bias_grads = vec![0.0; self.biases.len()];
        }
    }
}
