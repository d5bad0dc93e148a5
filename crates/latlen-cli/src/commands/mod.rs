pub mod config_ops;
pub mod distribution_ops;
