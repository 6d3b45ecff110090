//! End-to-end training behavior: loss goes down, progress reporting and
//! early termination work, bad inputs are rejected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use kiln::{
    ActivationFunction, DataLoader, LayerSpec, LossType, NetworkSpec, Optimizer, TrainConfig,
    evaluate, train_loop,
};

fn dense_regression_spec() -> NetworkSpec {
    NetworkSpec {
        name: "regression".into(),
        input_shape: (1, 1, 2),
        layers: vec![
            LayerSpec::Dense { size: 4, activation: ActivationFunction::ReLU },
            LayerSpec::Dense { size: 1, activation: ActivationFunction::Identity },
        ],
        loss: LossType::Mse,
        metadata: None,
    }
}

/// y = 0.5·x1 − 0.25·x2 on a small grid.
fn regression_data() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    for i in 0..4 {
        for j in 0..4 {
            let x1 = i as f64 / 3.0;
            let x2 = j as f64 / 3.0;
            inputs.push(vec![x1, x2]);
            targets.push(vec![0.5 * x1 - 0.25 * x2]);
        }
    }
    (inputs, targets)
}

#[test]
fn training_reduces_regression_loss() {
    let (inputs, targets) = regression_data();
    let mut network = dense_regression_spec().build().unwrap();
    let mut optimizer = Optimizer::sgd(0.05);
    let loader = DataLoader::new(4, true);
    let config = TrainConfig::new(100, LossType::Mse, 0);

    let initial = evaluate(&mut network, &inputs, &targets, LossType::Mse).loss;
    let final_loss = train_loop(
        &mut network, &inputs, &targets, None, None, &loader, &mut optimizer, &config,
    )
    .unwrap();

    assert!(
        final_loss < initial,
        "loss should decrease: initial={initial}, final={final_loss}"
    );
}

/// Two trivially separable classes: images bright in the top half vs. bright
/// in the bottom half.
fn classification_data() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    for variant in 0..10 {
        let shade = 0.5 + 0.05 * variant as f64;
        for class in 0..2 {
            let mut img = vec![0.0; 36];
            for y in 0..3usize {
                let rows = if class == 0 { y } else { 5 - y };
                for x in 0..6 {
                    img[rows * 6 + x] = shade;
                }
            }
            inputs.push(img);
            let mut one_hot = vec![0.0; 2];
            one_hot[class] = 1.0;
            targets.push(one_hot);
        }
    }
    (inputs, targets)
}

#[test]
fn conv_classifier_learns_separable_classes() {
    let spec = NetworkSpec {
        name: "tiny-conv".into(),
        input_shape: (1, 6, 6),
        layers: vec![
            LayerSpec::Conv2d { out_channels: 2, kernel_size: 3, stride: 1, activation: ActivationFunction::ReLU },
            LayerSpec::MaxPool2d { pool_size: 2, stride: 2 },
            LayerSpec::Dense { size: 2, activation: ActivationFunction::LogSoftmax },
        ],
        loss: LossType::Nll,
        metadata: None,
    };
    let (inputs, targets) = classification_data();
    let mut network = spec.build().unwrap();
    let mut optimizer = Optimizer::adam(0.01);
    let loader = DataLoader::new(5, true);
    let config = TrainConfig::new(100, LossType::Nll, 0);

    let initial = evaluate(&mut network, &inputs, &targets, LossType::Nll).loss;
    let final_loss = train_loop(
        &mut network, &inputs, &targets, None, None, &loader, &mut optimizer, &config,
    )
    .unwrap();
    let metrics = evaluate(&mut network, &inputs, &targets, LossType::Nll);

    assert!(
        final_loss < initial,
        "loss should decrease: initial={initial}, final={final_loss}"
    );
    assert!(
        metrics.accuracy >= 0.8,
        "separable classes should be mostly learned, got {:.2}",
        metrics.accuracy
    );
}

#[test]
fn progress_channel_gets_one_stats_per_epoch() {
    let (inputs, targets) = regression_data();
    let mut network = dense_regression_spec().build().unwrap();
    let mut optimizer = Optimizer::sgd(0.05);
    let loader = DataLoader::new(8, false);

    let (tx, rx) = mpsc::channel();
    let mut config = TrainConfig::new(3, LossType::Mse, 0);
    config.progress_tx = Some(tx);

    train_loop(&mut network, &inputs, &targets, None, None, &loader, &mut optimizer, &config)
        .unwrap();
    drop(config);

    let stats: Vec<_> = rx.iter().collect();
    assert_eq!(stats.len(), 3);
    for (i, s) in stats.iter().enumerate() {
        assert_eq!(s.epoch, i + 1);
        assert_eq!(s.total_epochs, 3);
        // 16 samples in batches of 8.
        assert_eq!(s.steps, 2);
        assert!(s.train_loss.is_finite());
    }
}

#[test]
fn validation_metrics_are_reported_when_requested() {
    let (inputs, targets) = regression_data();
    let mut network = dense_regression_spec().build().unwrap();
    let mut optimizer = Optimizer::sgd(0.05);
    let loader = DataLoader::new(8, false);

    let (tx, rx) = mpsc::channel();
    let mut config = TrainConfig::new(1, LossType::Mse, 0);
    config.progress_tx = Some(tx);

    train_loop(
        &mut network,
        &inputs,
        &targets,
        Some(&inputs),
        Some(&targets),
        &loader,
        &mut optimizer,
        &config,
    )
    .unwrap();
    drop(config);

    let stats = rx.recv().unwrap();
    assert!(stats.val_loss.is_some());
    // MSE runs report no accuracy.
    assert!(stats.train_accuracy.is_none());
    assert!(stats.val_accuracy.is_none());
}

#[test]
fn preset_stop_flag_prevents_training() {
    let (inputs, targets) = regression_data();
    let mut network = dense_regression_spec().build().unwrap();
    let mut optimizer = Optimizer::sgd(0.05);
    let loader = DataLoader::new(4, false);

    let flag = Arc::new(AtomicBool::new(false));
    flag.store(true, Ordering::Relaxed);
    let (tx, rx) = mpsc::channel();
    let mut config = TrainConfig::new(50, LossType::Mse, 0);
    config.stop_flag = Some(flag);
    config.progress_tx = Some(tx);

    train_loop(&mut network, &inputs, &targets, None, None, &loader, &mut optimizer, &config)
        .unwrap();
    drop(config);

    // No epoch completed, so no stats were emitted.
    assert_eq!(rx.iter().count(), 0);
}

#[test]
fn empty_training_set_is_rejected() {
    let mut network = dense_regression_spec().build().unwrap();
    let mut optimizer = Optimizer::sgd(0.05);
    let loader = DataLoader::new(4, false);
    let config = TrainConfig::new(1, LossType::Mse, 0);

    let err = train_loop(&mut network, &[], &[], None, None, &loader, &mut optimizer, &config);
    assert!(err.is_err());
}

#[test]
fn mismatched_labels_are_rejected() {
    let (inputs, mut targets) = regression_data();
    targets.pop();
    let mut network = dense_regression_spec().build().unwrap();
    let mut optimizer = Optimizer::sgd(0.05);
    let loader = DataLoader::new(4, false);
    let config = TrainConfig::new(1, LossType::Mse, 0);

    let err = train_loop(
        &mut network, &inputs, &targets, None, None, &loader, &mut optimizer, &config,
    );
    assert!(err.is_err());
}
