//! XOR sanity demo: a tiny dense network trained with MSE and plain SGD.
//!
//! Run with:
//!   cargo run --example xor

use kiln::{
    ActivationFunction, DataLoader, LayerSpec, LossType, NetworkSpec, Optimizer, TrainConfig,
    train_loop,
};

fn main() {
    let spec = NetworkSpec {
        name: "xor".into(),
        input_shape: (1, 1, 2),
        layers: vec![
            LayerSpec::Dense { size: 4, activation: ActivationFunction::Sigmoid },
            LayerSpec::Dense { size: 1, activation: ActivationFunction::Sigmoid },
        ],
        loss: LossType::Mse,
        metadata: None,
    };
    let mut network = spec.build().expect("xor spec is valid");

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let mut optimizer = Optimizer::sgd(1.0);
    let loader = DataLoader::new(4, false);
    let config = TrainConfig::new(1, LossType::Mse, 0);
    let epochs = 10000;

    for epoch in 0..epochs {
        let loss = train_loop(
            &mut network,
            &inputs,
            &expected_outputs,
            None,
            None,
            &loader,
            &mut optimizer,
            &config,
        )
        .expect("training inputs are valid");
        if epoch % 1000 == 0 {
            println!("Epoch {epoch}: loss = {loss:.6}");
        }
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.forward(input)[0]);
    }
}
