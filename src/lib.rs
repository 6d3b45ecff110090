pub mod activation;
pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use config::AppConfig;
pub use data::loader::DataLoader;
pub use data::mnist::MnistDataset;
pub use error::KilnError;
pub use layers::Layer;
pub use loss::loss_type::LossType;
pub use math::matrix::Matrix;
pub use network::lenet::lenet5;
pub use network::network::Network;
pub use network::spec::{LayerSpec, NetworkSpec};
pub use optim::optimizer::Optimizer;
pub use train::train_config::TrainConfig;
pub use train::trainer::{evaluate, train_loop};
