pub mod loss_type;
pub mod mse;
pub mod nll;
