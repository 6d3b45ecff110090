use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::KilnError;
use crate::layers::{Conv2dLayer, DenseLayer, Layer, MaxPool2dLayer};
use crate::loss::loss_type::LossType;
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;

/// Describes one layer in a network specification. Input sizes are not
/// stored; `NetworkSpec::build()` infers them by threading the shape from
/// `input_shape` through the stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Conv2d {
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        activation: ActivationFunction,
    },
    MaxPool2d {
        pool_size: usize,
        stride: usize,
    },
    Dense {
        size: usize,
        activation: ActivationFunction,
    },
}

/// A fully serializable description of a network architecture plus its
/// training loss type and optional metadata.
///
/// A `NetworkSpec` can be saved to / loaded from JSON independently of the
/// trained weights, making it possible to store architecture configurations
/// before training starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    /// Shape of one input sample as (channels, height, width).
    pub input_shape: (usize, usize, usize),
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    /// Loss function to pair with this network during training.
    pub loss: LossType,
    /// Optional metadata (description, input type, output labels).
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

/// Shape threading state while building: spatial until the first dense
/// layer, flat afterwards.
enum Shape {
    Spatial(usize, usize, usize),
    Flat(usize),
}

impl Shape {
    fn flat_len(&self) -> usize {
        match *self {
            Shape::Spatial(c, h, w) => c * h * w,
            Shape::Flat(n) => n,
        }
    }
}

impl NetworkSpec {
    /// Instantiates the network with freshly initialized parameters,
    /// validating the shape chain layer by layer.
    pub fn build(&self) -> Result<Network, KilnError> {
        if self.layers.is_empty() {
            return Err(KilnError::InvalidSpec("spec has no layers".into()));
        }
        let (c, h, w) = self.input_shape;
        if c == 0 || h == 0 || w == 0 {
            return Err(KilnError::InvalidSpec(format!(
                "input shape ({c}, {h}, {w}) has a zero dimension"
            )));
        }

        let last = self.layers.len() - 1;
        let mut shape = Shape::Spatial(c, h, w);
        let mut layers = Vec::with_capacity(self.layers.len());

        for (i, spec) in self.layers.iter().enumerate() {
            match *spec {
                LayerSpec::Conv2d { out_channels, kernel_size, stride, activation } => {
                    let (c, h, w) = spatial(&shape, i, "conv2d")?;
                    check_window(i, "conv2d kernel", kernel_size, stride, h, w)?;
                    if out_channels == 0 {
                        return Err(KilnError::InvalidSpec(format!(
                            "layer {i}: conv2d needs at least one output channel"
                        )));
                    }
                    check_activation(i, activation, i == last)?;
                    let layer = Conv2dLayer::new((c, h, w), out_channels, kernel_size, stride, activation);
                    shape = {
                        let (oc, oh, ow) = layer.out_shape();
                        Shape::Spatial(oc, oh, ow)
                    };
                    layers.push(Layer::Conv2d(layer));
                }
                LayerSpec::MaxPool2d { pool_size, stride } => {
                    let (c, h, w) = spatial(&shape, i, "max_pool2d")?;
                    check_window(i, "pool window", pool_size, stride, h, w)?;
                    let layer = MaxPool2dLayer::new((c, h, w), pool_size, stride);
                    shape = {
                        let (oc, oh, ow) = layer.out_shape();
                        Shape::Spatial(oc, oh, ow)
                    };
                    layers.push(Layer::MaxPool2d(layer));
                }
                LayerSpec::Dense { size, activation } => {
                    if size == 0 {
                        return Err(KilnError::InvalidSpec(format!(
                            "layer {i}: dense layer needs at least one neuron"
                        )));
                    }
                    check_activation(i, activation, i == last)?;
                    let input_len = shape.flat_len();
                    layers.push(Layer::Dense(DenseLayer::new(input_len, size, activation)));
                    shape = Shape::Flat(size);
                }
            }
        }

        Ok(Network::new(layers))
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<(), KilnError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &Path) -> Result<NetworkSpec, KilnError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn spatial(shape: &Shape, i: usize, kind: &str) -> Result<(usize, usize, usize), KilnError> {
    match *shape {
        Shape::Spatial(c, h, w) => Ok((c, h, w)),
        Shape::Flat(_) => Err(KilnError::InvalidSpec(format!(
            "layer {i}: {kind} cannot follow a dense layer (spatial shape is lost)"
        ))),
    }
}

fn check_window(
    i: usize,
    what: &str,
    window: usize,
    stride: usize,
    h: usize,
    w: usize,
) -> Result<(), KilnError> {
    if window == 0 || stride == 0 {
        return Err(KilnError::InvalidSpec(format!(
            "layer {i}: {what} size and stride must be at least 1"
        )));
    }
    if window > h || window > w {
        return Err(KilnError::InvalidSpec(format!(
            "layer {i}: {what} {window}×{window} exceeds input {h}×{w}"
        )));
    }
    if (h - window) % stride != 0 || (w - window) % stride != 0 {
        return Err(KilnError::InvalidSpec(format!(
            "layer {i}: {what} {window}×{window} with stride {stride} does not tile input {h}×{w}"
        )));
    }
    Ok(())
}

fn check_activation(i: usize, activation: ActivationFunction, is_last: bool) -> Result<(), KilnError> {
    if activation == ActivationFunction::LogSoftmax && !is_last {
        return Err(KilnError::InvalidSpec(format!(
            "layer {i}: log_softmax is only valid on the final layer"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_conv_spec() -> NetworkSpec {
        NetworkSpec {
            name: "tiny".into(),
            input_shape: (1, 6, 6),
            layers: vec![
                LayerSpec::Conv2d { out_channels: 2, kernel_size: 3, stride: 1, activation: ActivationFunction::ReLU },
                LayerSpec::MaxPool2d { pool_size: 2, stride: 2 },
                LayerSpec::Dense { size: 3, activation: ActivationFunction::LogSoftmax },
            ],
            loss: LossType::Nll,
            metadata: None,
        }
    }

    #[test]
    fn builds_and_threads_shapes() {
        let mut network = tiny_conv_spec().build().unwrap();
        // conv 1×6×6 → 2×4×4, pool → 2×2×2, dense → 3
        assert_eq!(network.output_len(), 3);
        let out = network.forward(&vec![0.5; 36]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn rejects_oversized_kernel() {
        let mut spec = tiny_conv_spec();
        spec.layers[0] = LayerSpec::Conv2d {
            out_channels: 2,
            kernel_size: 7,
            stride: 1,
            activation: ActivationFunction::ReLU,
        };
        let err = spec.build().unwrap_err();
        assert!(matches!(err, KilnError::InvalidSpec(_)), "got {err:?}");
    }

    #[test]
    fn rejects_conv_after_dense() {
        let mut spec = tiny_conv_spec();
        spec.layers = vec![
            LayerSpec::Dense { size: 4, activation: ActivationFunction::ReLU },
            LayerSpec::Conv2d { out_channels: 1, kernel_size: 1, stride: 1, activation: ActivationFunction::ReLU },
        ];
        assert!(matches!(spec.build().unwrap_err(), KilnError::InvalidSpec(_)));
    }

    #[test]
    fn rejects_log_softmax_before_final_layer() {
        let mut spec = tiny_conv_spec();
        spec.layers = vec![
            LayerSpec::Dense { size: 4, activation: ActivationFunction::LogSoftmax },
            LayerSpec::Dense { size: 3, activation: ActivationFunction::Identity },
        ];
        assert!(matches!(spec.build().unwrap_err(), KilnError::InvalidSpec(_)));
    }

    #[test]
    fn rejects_untileable_stride() {
        let mut spec = tiny_conv_spec();
        // (6 - 3) % 2 != 0
        spec.layers[0] = LayerSpec::Conv2d {
            out_channels: 2,
            kernel_size: 3,
            stride: 2,
            activation: ActivationFunction::ReLU,
        };
        assert!(matches!(spec.build().unwrap_err(), KilnError::InvalidSpec(_)));
    }

    #[test]
    fn rejects_empty_layer_list() {
        let mut spec = tiny_conv_spec();
        spec.layers.clear();
        assert!(matches!(spec.build().unwrap_err(), KilnError::InvalidSpec(_)));
    }
}
