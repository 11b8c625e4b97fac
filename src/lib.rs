pub mod aggregation;
pub mod config;
pub mod encryption;
pub mod errors;
