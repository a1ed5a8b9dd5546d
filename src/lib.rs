pub mod benchmarks;
pub mod command;
pub mod config;
pub mod error;
pub mod path_utils;
pub mod system_info;

pub use error::BenchError;
