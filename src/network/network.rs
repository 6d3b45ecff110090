use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::KilnError;
use crate::layers::{Layer, ParamView};

/// An ordered stack of layers exchanging flat `Vec<f64>` activations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    pub fn new(layers: Vec<Layer>) -> Network {
        Network { layers }
    }

    /// Forward pass; each layer caches what its backward pass needs.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Backpropagates the loss delta (∂L/∂output) through all layers,
    /// accumulating parameter gradients. Must follow a `forward()` on the
    /// same sample.
    pub fn backward(&mut self, loss_delta: &[f64]) {
        let mut delta = loss_delta.to_vec();
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta);
        }
    }

    pub fn zero_grad(&mut self) {
        for layer in &mut self.layers {
            layer.zero_grad();
        }
    }

    /// Scales every accumulated gradient, e.g. by 1/batch_size to turn
    /// per-sample sums into mini-batch means.
    pub fn scale_grads(&mut self, factor: f64) {
        for view in self.param_views() {
            for g in view.grads.iter_mut() {
                *g *= factor;
            }
        }
    }

    /// All parameter/gradient views in layer order. The order is stable, so
    /// optimizers can keep per-tensor state indexed the same way.
    pub fn param_views(&mut self) -> Vec<ParamView<'_>> {
        self.layers.iter_mut().flat_map(|l| l.param_views()).collect()
    }

    /// Length of the output vector produced by the final layer.
    pub fn output_len(&self) -> usize {
        self.layers.last().map(|l| l.output_len()).unwrap_or(0)
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    /// Caches and gradient accumulators are not persisted.
    pub fn save_json(&self, path: &Path) -> Result<(), KilnError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by
    /// `save_json`.
    pub fn load_json(path: &Path) -> Result<Network, KilnError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
