use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;

/// 2-D convolution over (channels, height, width) data carried as a flat
/// `Vec<f64>` in channel-major order, the same layout the dataset and the
/// pooling layer use.
///
/// Square kernels, configurable stride, no padding: the output spatial size
/// is (in - kernel) / stride + 1 per axis. One bias per output channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2dLayer {
    /// Input shape as (channels, height, width).
    pub in_shape: (usize, usize, usize),
    pub out_channels: usize,
    pub kernel_size: usize,
    pub stride: usize,
    pub activation: ActivationFunction,
    /// Kernel bank, (out_channels × in_channels·k·k). Row f holds filter f's
    /// weights in (channel, ky, kx) order.
    pub kernels: Matrix,
    pub biases: Vec<f64>,
    #[serde(skip)]
    input_cache: Vec<f64>,
    #[serde(skip)]
    pre_activation: Vec<f64>,
    #[serde(skip)]
    kernel_grads: Vec<f64>,
    #[serde(skip)]
    bias_grads: Vec<f64>,
}

impl Conv2dLayer {
    /// He-initialized kernels (fan-in = in_channels·k·k), zero biases.
    pub fn new(
        in_shape: (usize, usize, usize),
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        activation: ActivationFunction,
    ) -> Conv2dLayer {
        let fan_in = in_shape.0 * kernel_size * kernel_size;
        Conv2dLayer {
            in_shape,
            out_channels,
            kernel_size,
            stride,
            activation,
            kernels: Matrix::he(out_channels, fan_in, fan_in),
            biases: vec![0.0; out_channels],
            input_cache: Vec::new(),
            pre_activation: Vec::new(),
            kernel_grads: vec![0.0; out_channels * fan_in],
            bias_grads: vec![0.0; out_channels],
        }
    }

    /// Output spatial dimensions (height, width).
    pub fn out_dims(&self) -> (usize, usize) {
        let (_, in_h, in_w) = self.in_shape;
        (
            (in_h - self.kernel_size) / self.stride + 1,
            (in_w - self.kernel_size) / self.stride + 1,
        )
    }

    /// Output shape as (channels, height, width).
    pub fn out_shape(&self) -> (usize, usize, usize) {
        let (out_h, out_w) = self.out_dims();
        (self.out_channels, out_h, out_w)
    }

    pub fn output_len(&self) -> usize {
        let (c, h, w) = self.out_shape();
        c * h * w
    }

    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let (in_c, in_h, in_w) = self.in_shape;
        debug_assert_eq!(input.len(), in_c * in_h * in_w);
        let (out_h, out_w) = self.out_dims();
        let k = self.kernel_size;

        let mut z = vec![0.0; self.out_channels * out_h * out_w];
        for f in 0..self.out_channels {
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut acc = self.biases[f];
                    for c in 0..in_c {
                        for ky in 0..k {
                            let iy = oy * self.stride + ky;
                            let in_row = (c * in_h + iy) * in_w + ox * self.stride;
                            let k_row = (c * k + ky) * k;
                            for kx in 0..k {
                                acc += input[in_row + kx] * self.kernels.at(f, k_row + kx);
                            }
                        }
                    }
                    z[(f * out_h + oy) * out_w + ox] = acc;
                }
            }
        }

        let a: Vec<f64> = z.iter().map(|&v| self.activation.function(v)).collect();
        self.input_cache = input.to_vec();
        self.pre_activation = z;
        a
    }

    /// Consumes ∂L/∂a for the output feature maps, accumulates kernel/bias
    /// gradients, and returns ∂L/∂a for the input planes.
    pub fn backward(&mut self, delta: &[f64]) -> Vec<f64> {
        let (in_c, in_h, in_w) = self.in_shape;
        let (out_h, out_w) = self.out_dims();
        let k = self.kernel_size;
        debug_assert_eq!(delta.len(), self.out_channels * out_h * out_w);
        debug_assert_eq!(self.input_cache.len(), in_c * in_h * in_w, "backward without forward");
        self.ensure_grads();

        let fan_in = in_c * k * k;
        let mut prev = vec![0.0; in_c * in_h * in_w];

        for f in 0..self.out_channels {
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let out_idx = (f * out_h + oy) * out_w + ox;
                    let d = delta[out_idx] * self.activation.derivative(self.pre_activation[out_idx]);
                    if d == 0.0 {
                        continue;
                    }
                    self.bias_grads[f] += d;
                    for c in 0..in_c {
                        for ky in 0..k {
                            let iy = oy * self.stride + ky;
                            let in_row = (c * in_h + iy) * in_w + ox * self.stride;
                            let k_row = (c * k + ky) * k;
                            for kx in 0..k {
                                let k_idx = k_row + kx;
                                self.kernel_grads[f * fan_in + k_idx] +=
                                    d * self.input_cache[in_row + kx];
                                prev[in_row + kx] += d * self.kernels.at(f, k_idx);
                            }
                        }
                    }
                }
            }
        }
        prev
    }

    pub fn zero_grad(&mut self) {
        self.kernel_grads.clear();
        self.kernel_grads.resize(self.kernels.len(), 0.0);
        self.bias_grads.clear();
        self.bias_grads.resize(self.biases.len(), 0.0);
    }

    pub fn param_views(&mut self) -> Vec<super::ParamView<'_>> {
        vec![
            super::ParamView {
                values: &mut self.kernels.data,
                grads: &mut self.kernel_grads,
            },
            super::ParamView {
                values: &mut self.biases,
                grads: &mut self.bias_grads,
            },
        ]
    }

    fn ensure_grads(&mut self) {
        if self.kernel_grads.len() != self.kernels.len() {
            self.kernel_grads = vec![0.0; self.kernels.len()];
        }
        if self.bias_grads.len() != self.biases.len() {
            self.bias_grads = vec![0.0; self.biases.len()];
        }
    }
}
