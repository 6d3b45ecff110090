use crate::activation::activation::ActivationFunction;
use crate::loss::loss_type::LossType;
use crate::network::metadata::{InputType, ModelMetadata};
use crate::network::spec::{LayerSpec, NetworkSpec};

/// The classic LeNet-5 stack for 1×32×32 grayscale input:
///
/// ```text
/// conv 6×5×5  → ReLU → maxpool 2×2     (6×28×28 → 6×14×14)
/// conv 16×5×5 → ReLU → maxpool 2×2     (16×10×10 → 16×5×5)
/// conv 120×5×5 → ReLU                  (120×1×1)
/// dense 84 → ReLU
/// dense num_classes → log-softmax
/// ```
///
/// Paired with NLL loss. For MNIST digits pass `num_classes = 10`; the
/// 28×28 source images are resized to 32×32 by the dataset loader.
pub fn lenet5(num_classes: usize) -> NetworkSpec {
    NetworkSpec {
        name: "lenet5".into(),
        input_shape: (1, 32, 32),
        layers: vec![
            LayerSpec::Conv2d { out_channels: 6, kernel_size: 5, stride: 1, activation: ActivationFunction::ReLU },
            LayerSpec::MaxPool2d { pool_size: 2, stride: 2 },
            LayerSpec::Conv2d { out_channels: 16, kernel_size: 5, stride: 1, activation: ActivationFunction::ReLU },
            LayerSpec::MaxPool2d { pool_size: 2, stride: 2 },
            LayerSpec::Conv2d { out_channels: 120, kernel_size: 5, stride: 1, activation: ActivationFunction::ReLU },
            LayerSpec::Dense { size: 84, activation: ActivationFunction::ReLU },
            LayerSpec::Dense { size: num_classes, activation: ActivationFunction::LogSoftmax },
        ],
        loss: LossType::Nll,
        metadata: Some(ModelMetadata {
            description: Some("LeNet-5 convolutional image classifier".into()),
            input_type: Some(InputType::ImageGrayscale { width: 32, height: 32 }),
            output_labels: Some((0..num_classes).map(|c| c.to_string()).collect()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenet5_builds_with_ten_outputs() {
        let spec = lenet5(10);
        let mut network = spec.build().expect("canonical LeNet-5 must validate");
        assert_eq!(network.layers.len(), 7);
        assert_eq!(network.output_len(), 10);

        let out = network.forward(&vec![0.0; 32 * 32]);
        assert_eq!(out.len(), 10);
        // Log-softmax output exponentiates to a probability distribution.
        let sum: f64 = out.iter().map(|&v| v.exp()).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
