use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::loss::loss_type::LossType;
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`      — total number of full passes over the training data
/// - `loss_type`   — which loss function to use (`Nll` or `Mse`)
/// - `log_every`   — emit a status line every N optimization steps;
///                   `0` disables step logging (epoch summaries still go out)
/// - `progress_tx` — optional channel sender; one `EpochStats` is sent per
///                   completed epoch. If the receiver is dropped the loop
///                   terminates early (clean shutdown).
/// - `stop_flag`   — optional atomic flag; when set to `true` from another
///                   thread the loop terminates after the current epoch.
pub struct TrainConfig {
    pub epochs: usize,
    pub loss_type: LossType,
    pub log_every: usize,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel and no stop flag.
    pub fn new(epochs: usize, loss_type: LossType, log_every: usize) -> Self {
        TrainConfig {
            epochs,
            loss_type,
            log_every,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
