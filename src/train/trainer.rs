use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::data::loader::DataLoader;
use crate::error::KilnError;
use crate::loss::loss_type::LossType;
use crate::network::network::Network;
use crate::optim::optimizer::Optimizer;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs and returns the mean training
/// loss of the **last completed epoch**.
///
/// Each mini-batch runs the fixed five-step sequence: reset gradients,
/// forward pass, loss computation, backpropagation, optimizer step. A status
/// line is logged every `config.log_every` steps.
///
/// # Arguments
/// - `network`      — mutable reference to the network; modified in place
/// - `train_inputs` — training samples, each a flat `Vec<f64>`
/// - `train_labels` — corresponding targets, same length as `train_inputs`
/// - `val_inputs`   — optional validation samples
/// - `val_labels`   — optional validation targets (required iff `val_inputs` is `Some`)
/// - `loader`       — mini-batch size and shuffling behavior
/// - `optimizer`    — SGD or Adam; carries the learning rate and any state
/// - `config`       — epochs, loss, log frequency, progress channel, stop flag
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
pub fn train_loop(
    network: &mut Network,
    train_inputs: &[Vec<f64>],
    train_labels: &[Vec<f64>],
    val_inputs: Option<&[Vec<f64>]>,
    val_labels: Option<&[Vec<f64>]>,
    loader: &DataLoader,
    optimizer: &mut Optimizer,
    config: &TrainConfig,
) -> Result<f64, KilnError> {
    if train_inputs.is_empty() {
        return Err(KilnError::Dataset("training set is empty".into()));
    }
    if train_inputs.len() != train_labels.len() {
        return Err(KilnError::Dataset(format!(
            "got {} training samples but {} labels",
            train_inputs.len(),
            train_labels.len()
        )));
    }
    if loader.batch_size == 0 {
        return Err(KilnError::Config("batch_size must be at least 1".into()));
    }
    if val_inputs.map(|v| v.len()) != val_labels.map(|v| v.len()) {
        return Err(KilnError::Dataset(
            "validation samples and labels must be provided together with equal length".into(),
        ));
    }

    let mut last_train_loss = 0.0;

    for epoch in 1..=config.epochs {
        // Check stop flag at the top of each epoch.
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break;
            }
        }

        let t_start = Instant::now();

        // ── One full pass over the training data ───────────────────────────
        let (train_loss, steps) = run_one_epoch(
            network,
            train_inputs,
            train_labels,
            loader,
            optimizer,
            config,
            epoch,
        );
        last_train_loss = train_loss;

        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        // ── Accuracy (NLL only) ────────────────────────────────────────────
        let train_accuracy = if config.loss_type == LossType::Nll {
            Some(compute_accuracy(network, train_inputs, train_labels))
        } else {
            None
        };

        // ── Validation ─────────────────────────────────────────────────────
        let (val_loss, val_accuracy) = if let (Some(vi), Some(vl)) = (val_inputs, val_labels) {
            let vl_val = compute_eval_loss(network, vi, vl, config.loss_type);
            let va = if config.loss_type == LossType::Nll {
                Some(compute_accuracy(network, vi, vl))
            } else {
                None
            };
            (Some(vl_val), va)
        } else {
            (None, None)
        };

        log::info!(
            "epoch {}/{}: train loss {:.6}{}{}",
            epoch,
            config.epochs,
            train_loss,
            train_accuracy.map(|a| format!(", train acc {:.2}%", a * 100.0)).unwrap_or_default(),
            val_loss.map(|l| format!(", val loss {l:.6}")).unwrap_or_default(),
        );

        // ── Emit progress ──────────────────────────────────────────────────
        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            steps,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
            elapsed_ms,
        };

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }

        // Check stop flag again after potentially expensive eval.
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break;
            }
        }
    }

    Ok(last_train_loss)
}

/// Loss and argmax accuracy over a dataset, without touching gradients.
#[derive(Debug, Clone, Copy)]
pub struct EvalMetrics {
    pub loss: f64,
    pub accuracy: f64,
}

/// Evaluates `network` over a full dataset (eval mode: forward passes only).
pub fn evaluate(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
    loss_type: LossType,
) -> EvalMetrics {
    EvalMetrics {
        loss: compute_eval_loss(network, inputs, labels, loss_type),
        accuracy: compute_accuracy(network, inputs, labels),
    }
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one full epoch of mini-batch training. Returns the mean loss over
/// all samples and the number of optimizer steps taken.
fn run_one_epoch(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
    loader: &DataLoader,
    optimizer: &mut Optimizer,
    config: &TrainConfig,
    epoch: usize,
) -> (f64, usize) {
    let n = inputs.len();
    let mut total_loss = 0.0;
    let mut steps = 0usize;

    for (step, batch) in loader.batches(inputs, labels).enumerate() {
        // (1) Reset the gradients.
        optimizer.zero_grad(network);

        // (2)–(4) Forward, loss, backpropagation — accumulated per sample.
        let mut batch_loss = 0.0;
        for (input, expected) in batch.inputs.iter().zip(batch.targets.iter()) {
            let output = network.forward(input);
            batch_loss += config.loss_type.loss(&output, expected);
            let delta = config.loss_type.derivative(&output, expected);
            network.backward(&delta);
        }

        // Average the accumulated gradients over the true batch size.
        network.scale_grads(1.0 / batch.len() as f64);

        // (5) Update the parameters.
        optimizer.step(network);

        total_loss += batch_loss;
        steps += 1;

        if config.log_every > 0 && step % config.log_every == 0 {
            log::info!(
                "epoch {epoch} step {step}: loss = {:.6}",
                batch_loss / batch.len() as f64
            );
        }
    }

    (total_loss / n as f64, steps)
}

/// Mean loss over a full dataset without gradient accumulation (eval mode).
fn compute_eval_loss(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
    loss_type: LossType,
) -> f64 {
    let n = inputs.len();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = inputs.iter().zip(labels.iter())
        .map(|(input, label)| {
            let output = network.forward(input);
            loss_type.loss(&output, label)
        })
        .sum();
    total / n as f64
}

/// Fraction of samples classified correctly (argmax match).
fn compute_accuracy(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
) -> f64 {
    let n = inputs.len();
    if n == 0 {
        return 0.0;
    }
    let correct: usize = inputs.iter().zip(labels.iter())
        .filter(|(input, label)| {
            let output = network.forward(input);
            argmax(&output) == argmax(label)
        })
        .count();
    correct as f64 / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_the_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.9, 0.2]), 2);
        assert_eq!(argmax(&[-5.0, -1.0, -3.0]), 1);
        // Ties resolve to the last maximal index (max_by semantics).
        assert_eq!(argmax(&[0.9, 0.9]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
