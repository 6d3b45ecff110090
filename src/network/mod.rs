pub mod lenet;
pub mod metadata;
pub mod network;
pub mod spec;
