use log::{debug, info, warn};
use std::time::Instant;

use crate::benchmarks::catalog::WorkloadParameter;
use crate::benchmarks::results::{
    BenchmarkResult, FailureStage, IterationFailure, IterationReport, ResultAnalyzer, RunResult,
};
use crate::benchmarks::state::{BenchmarkState, SetupOptions};
use crate::error::BenchError;

/// What one iteration produced
#[derive(Debug, Default)]
struct IterationOutcome {
    samples: Vec<RunResult>,
    failure: Option<IterationFailure>,
    report: Option<IterationReport>,
}

/// Drives the setup, benchmark and teardown cycle of a single workload and
/// times the fetches
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    options: SetupOptions,
    warmup: usize,
    iterations: usize,
    runs_per_iteration: usize,
}

impl BenchmarkRunner {
    pub fn new(options: SetupOptions) -> Self {
        Self {
            options,
            warmup: 0,
            iterations: 1,
            runs_per_iteration: 1,
        }
    }

    /// Iterations run before measuring; their samples are discarded
    pub fn warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Measured iterations, each with a freshly provisioned state
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Timed fetches per iteration
    pub fn runs_per_iteration(mut self, runs: usize) -> Self {
        self.runs_per_iteration = runs;
        self
    }

    pub fn options(&self) -> &SetupOptions {
        &self.options
    }

    /// Benchmark one workload.
    ///
    /// Setup and fetch failures only cost the affected iteration and are
    /// recorded in the result. A configuration error aborts the workload and
    /// is returned.
    pub fn run_workload(&self, parameter: &WorkloadParameter) -> Result<BenchmarkResult, BenchError> {
        info!(
            "Running benchmark: {parameter} ({} warmup, {} iterations x {} runs)",
            self.warmup, self.iterations, self.runs_per_iteration
        );

        for iteration in 0..self.warmup {
            let outcome = self.run_iteration(parameter, iteration)?;
            debug!(
                "Warmup iteration {iteration} of {parameter} finished with {} samples",
                outcome.samples.len()
            );
        }

        let mut runs = Vec::with_capacity(self.iterations * self.runs_per_iteration);
        let mut failures = Vec::new();
        let mut iterations = Vec::with_capacity(self.iterations);

        for iteration in 0..self.iterations {
            let outcome = self.run_iteration(parameter, iteration)?;
            runs.extend(outcome.samples);
            failures.extend(outcome.failure);
            iterations.extend(outcome.report);
        }

        let summary = ResultAnalyzer::calculate_summary(&runs);
        info!(
            "Finished {parameter}: {} samples, {} failed iterations, mean {:.2} ms",
            runs.len(),
            failures.len(),
            summary.mean
        );

        Ok(BenchmarkResult {
            parameter: parameter.clone(),
            runs,
            failures,
            iterations,
            summary,
        })
    }

    fn run_iteration(
        &self,
        parameter: &WorkloadParameter,
        iteration: usize,
    ) -> Result<IterationOutcome, BenchError> {
        let mut state = match BenchmarkState::setup(parameter, &self.options) {
            Ok(state) => state,
            Err(e) if e.is_configuration() => return Err(e),
            Err(e) => {
                warn!("Iteration {iteration} of {parameter} skipped: {}", e.detailed());
                return Ok(IterationOutcome {
                    failure: Some(IterationFailure {
                        iteration,
                        stage: FailureStage::Setup,
                        message: e.detailed(),
                    }),
                    ..IterationOutcome::default()
                });
            }
        };

        let mut outcome = IterationOutcome::default();
        for run in 0..self.runs_per_iteration {
            let start = Instant::now();
            let fetched = state.run_fetch();
            let duration = start.elapsed();

            match fetched {
                Ok(()) => outcome.samples.push(RunResult {
                    iteration,
                    run,
                    duration_ms: duration.as_secs_f64() * 1000.0,
                }),
                Err(e) => {
                    warn!(
                        "Discarding sample {run} of iteration {iteration} for {parameter}: {}",
                        e.detailed()
                    );
                    outcome.failure = Some(IterationFailure {
                        iteration,
                        stage: FailureStage::Benchmark,
                        message: e.detailed(),
                    });
                    break;
                }
            }
        }

        let teardown = state.teardown();
        outcome.report = Some(IterationReport {
            iteration,
            target_valid: teardown.target_valid,
            scratch_removed: teardown.scratch_removed,
        });
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unknown_implementation_aborts_workload() {
        let base = tempdir().unwrap();
        let runner = BenchmarkRunner::new(SetupOptions {
            scratch_base: base.path().to_path_buf(),
            ..SetupOptions::default()
        })
        .iterations(3);

        let err = runner
            .run_workload(&WorkloadParameter::new("jgit", "https://example.com/x.git"))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_setup_failures_are_recorded_per_iteration() {
        let base = tempdir().unwrap();
        let missing = base.path().join("missing.git");
        let scratch = base.path().join("scratch");
        let runner = BenchmarkRunner::new(SetupOptions {
            scratch_base: scratch.clone(),
            ..SetupOptions::default()
        })
        .iterations(2)
        .runs_per_iteration(3);

        let result = runner
            .run_workload(&WorkloadParameter::new("libgit2", missing.to_string_lossy()))
            .unwrap();
        assert!(result.runs.is_empty());
        assert_eq!(result.failures.len(), 2);
        assert!(result
            .failures
            .iter()
            .all(|f| f.stage == FailureStage::Setup));
        assert!(result.iterations.is_empty());
        assert_eq!(result.summary.mean, 0.0);
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }
}
