use serde::{Serialize, Deserialize};

/// Max pooling over (channels, height, width) data in flat channel-major
/// layout. Square window, configurable stride, no padding.
///
/// `forward()` records the flat input index of each window maximum;
/// `backward()` scatters the incoming deltas back to exactly those
/// positions. The layer has no parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPool2dLayer {
    /// Input shape as (channels, height, width).
    pub in_shape: (usize, usize, usize),
    pub pool_size: usize,
    pub stride: usize,
    #[serde(skip)]
    max_indices: Vec<usize>,
}

impl MaxPool2dLayer {
    pub fn new(in_shape: (usize, usize, usize), pool_size: usize, stride: usize) -> MaxPool2dLayer {
        MaxPool2dLayer {
            in_shape,
            pool_size,
            stride,
            max_indices: Vec::new(),
        }
    }

    /// Output spatial dimensions (height, width).
    pub fn out_dims(&self) -> (usize, usize) {
        let (_, in_h, in_w) = self.in_shape;
        (
            (in_h - self.pool_size) / self.stride + 1,
            (in_w - self.pool_size) / self.stride + 1,
        )
    }

    /// Output shape as (channels, height, width); pooling preserves channels.
    pub fn out_shape(&self) -> (usize, usize, usize) {
        let (out_h, out_w) = self.out_dims();
        (self.in_shape.0, out_h, out_w)
    }

    pub fn output_len(&self) -> usize {
        let (c, h, w) = self.out_shape();
        c * h * w
    }

    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let (channels, in_h, in_w) = self.in_shape;
        debug_assert_eq!(input.len(), channels * in_h * in_w);
        let (out_h, out_w) = self.out_dims();

        let mut output = vec![0.0; channels * out_h * out_w];
        let mut max_indices = vec![0usize; output.len()];

        for c in 0..channels {
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut max_val = f64::NEG_INFINITY;
                    let mut max_idx = 0usize;
                    for py in 0..self.pool_size {
                        let iy = oy * self.stride + py;
                        for px in 0..self.pool_size {
                            let ix = ox * self.stride + px;
                            let idx = (c * in_h + iy) * in_w + ix;
                            if input[idx] > max_val {
                                max_val = input[idx];
                                max_idx = idx;
                            }
                        }
                    }
                    let out_idx = (c * out_h + oy) * out_w + ox;
                    output[out_idx] = max_val;
                    max_indices[out_idx] = max_idx;
                }
            }
        }

        self.max_indices = max_indices;
        output
    }

    /// Routes each output delta to the input position that won its window.
    /// Overlapping windows accumulate.
    pub fn backward(&mut self, delta: &[f64]) -> Vec<f64> {
        let (channels, in_h, in_w) = self.in_shape;
        debug_assert_eq!(delta.len(), self.max_indices.len(), "backward without forward");

        let mut prev = vec![0.0; channels * in_h * in_w];
        for (&d, &idx) in delta.iter().zip(self.max_indices.iter()) {
            prev[idx] += d;
        }
        prev
    }
}
