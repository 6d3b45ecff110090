//! Application configuration for the training binary.
//!
//! Every field has a default, so a partial JSON file (or no file at all)
//! yields a runnable configuration, and the CLI can override individual
//! values on top. The effective configuration is printed at startup so the
//! user sees exactly what a run will do.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::KilnError;
use crate::optim::optimizer::Optimizer;

/// Where the MNIST IDX files live and what resolution to feed the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            dir: PathBuf::from("data/mnist"),
            // LeNet-5 expects 32×32 input; stock 28×28 MNIST is resampled up.
            width: 32,
            height: 32,
        }
    }
}

/// Mini-batch settings for the training pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub batch_size: usize,
    pub shuffle: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig { batch_size: 128, shuffle: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub lr: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig { kind: OptimizerKind::Adam, lr: 0.001 }
    }
}

/// The structured configuration for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Description of the run, echoed in the startup banner.
    pub name: String,
    pub dataset: DatasetConfig,
    pub loader: LoaderConfig,
    pub optimizer: OptimizerConfig,
    /// Full passes over the training data.
    pub epochs: usize,
    /// Log a status line every N optimization steps; 0 disables step logging.
    pub log_every: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            name: "Training of a LeNet-5 classifier using a hand-written training loop".into(),
            dataset: DatasetConfig::default(),
            loader: LoaderConfig::default(),
            optimizer: OptimizerConfig::default(),
            epochs: 1,
            log_every: 10,
        }
    }
}

impl AppConfig {
    /// Reads a configuration from a JSON file. Missing fields fall back to
    /// their defaults, so the file only needs to name what it changes.
    pub fn load_json(path: &Path) -> Result<AppConfig, KilnError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serializes the configuration to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<(), KilnError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// The effective configuration as pretty-printed JSON, for the startup
    /// banner.
    pub fn pretty(&self) -> Result<String, KilnError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Instantiates the configured optimizer.
    pub fn build_optimizer(&self) -> Optimizer {
        match self.optimizer.kind {
            OptimizerKind::Sgd => Optimizer::sgd(self.optimizer.lr),
            OptimizerKind::Adam => Optimizer::adam(self.optimizer.lr),
        }
    }
}
