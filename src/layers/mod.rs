pub mod conv2d;
pub mod dense;
pub mod max_pool;

use serde::{Serialize, Deserialize};

pub use conv2d::Conv2dLayer;
pub use dense::DenseLayer;
pub use max_pool::MaxPool2dLayer;

/// Mutable view over one parameter tensor and its gradient accumulator.
/// `values` and `grads` always have equal length.
pub struct ParamView<'a> {
    pub values: &'a mut [f64],
    pub grads: &'a mut [f64],
}

/// One network layer. All layer kinds exchange flat `Vec<f64>` activations;
/// convolution and pooling interpret them as (channels, height, width)
/// planes in channel-major order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Dense(DenseLayer),
    Conv2d(Conv2dLayer),
    MaxPool2d(MaxPool2dLayer),
}

impl Layer {
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        match self {
            Layer::Dense(l) => l.forward(input),
            Layer::Conv2d(l) => l.forward(input),
            Layer::MaxPool2d(l) => l.forward(input),
        }
    }

    /// Consumes ∂L/∂a for this layer's output and returns ∂L/∂a for its
    /// input, accumulating any parameter gradients along the way. Must be
    /// preceded by `forward()` on the same sample.
    pub fn backward(&mut self, delta: &[f64]) -> Vec<f64> {
        match self {
            Layer::Dense(l) => l.backward(delta),
            Layer::Conv2d(l) => l.backward(delta),
            Layer::MaxPool2d(l) => l.backward(delta),
        }
    }

    pub fn zero_grad(&mut self) {
        match self {
            Layer::Dense(l) => l.zero_grad(),
            Layer::Conv2d(l) => l.zero_grad(),
            Layer::MaxPool2d(_) => {}
        }
    }

    /// Parameter/gradient views in a stable order; empty for parameterless
    /// layers.
    pub fn param_views(&mut self) -> Vec<ParamView<'_>> {
        match self {
            Layer::Dense(l) => l.param_views(),
            Layer::Conv2d(l) => l.param_views(),
            Layer::MaxPool2d(_) => Vec::new(),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            Layer::Dense(l) => l.output_len(),
            Layer::Conv2d(l) => l.output_len(),
            Layer::MaxPool2d(l) => l.output_len(),
        }
    }
}
