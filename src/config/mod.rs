/// Benchmark configuration
pub mod bench;
pub use bench::{load_bench_config, load_or_default, BenchConfig, RunOverrides};

/// Configuration traits
pub mod traits;
pub use traits::{Configuration, MergeableConfiguration, PathConfiguration};

/// Tests for configuration
#[cfg(test)]
mod tests;
