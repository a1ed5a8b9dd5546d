use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use serde::Serialize;
use std::path::PathBuf;

use crate::benchmarks::benchmark_runner::BenchmarkRunner;
use crate::benchmarks::catalog::WorkloadParameter;
use crate::benchmarks::export::ResultExporter;
use crate::benchmarks::results::{BenchmarkResult, ResultAnalyzer};
use crate::config::{BenchConfig, Configuration};
use crate::path_utils;
use crate::system_info::SystemInfo;

/// A workload that could not be benchmarked at all
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationFailure {
    pub parameter: WorkloadParameter,
    pub message: String,
}

/// Everything a matrix run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<BenchmarkResult>,
    pub failed_configurations: Vec<ConfigurationFailure>,
    /// Files written to the output directory
    pub exported: Vec<PathBuf>,
}

/// High-level orchestrator that benchmarks every workload of the matrix.
///
/// The MainRunner is responsible for:
/// 1. Preparing the output directory and recording the environment
/// 2. Walking the configured matrix, one workload at a time
/// 3. Delegating each workload to a BenchmarkRunner
/// 4. Exporting the collected results
pub struct MainRunner {
    config: BenchConfig,
    out_dir: PathBuf,
}

impl MainRunner {
    pub fn new(config: BenchConfig, out_dir: PathBuf) -> Result<Self> {
        debug!("Using output directory: {}", out_dir.display());
        path_utils::prepare_output_directory(&out_dir)?;

        if let Some(path) = config.config_path() {
            let name = path.file_name().context("Config path has no file name")?;
            path_utils::copy_file(path, &out_dir.join(name))?;
        }

        SystemInfo::collect().write_to(&out_dir.join("system_info"))?;

        Ok(Self { config, out_dir })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Benchmark the whole matrix and export the results.
    ///
    /// A workload whose configuration is unusable is logged and skipped; the
    /// remaining workloads still run.
    pub fn run(&self) -> Result<RunReport> {
        let runner = BenchmarkRunner::new(self.config.setup_options()?)
            .warmup(self.config.warmup)
            .iterations(self.config.iterations)
            .runs_per_iteration(self.config.runs_per_iteration);

        let workloads = self.config.workloads();
        let progress = ProgressBar::new(workloads.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40} {pos}/{len} workloads | {msg}")
                .context("Invalid progress bar template")?,
        );

        let mut report = RunReport::default();
        for parameter in &workloads {
            progress.set_message(parameter.to_string());
            match runner.run_workload(parameter) {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    error!("Skipping {parameter}: {}", e.detailed());
                    report.failed_configurations.push(ConfigurationFailure {
                        parameter: parameter.clone(),
                        message: e.detailed(),
                    });
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        for comparison in ResultAnalyzer::compare_implementations(&report.results) {
            info!(
                "{}: {} fastest ({:.2} ms mean)",
                comparison.repository, comparison.fastest_implementation, comparison.fastest_mean_ms
            );
            for other in &comparison.comparisons {
                info!(
                    "    {} is {:.2} ± {:.2} times slower",
                    other.implementation, other.times_slower, other.error
                );
            }
        }

        report.exported = ResultExporter::export_all(&report.results, &self.out_dir)?;
        info!(
            "Wrote {} result files to {}",
            report.exported.len(),
            self.out_dir.display()
        );
        Ok(report)
    }
}
