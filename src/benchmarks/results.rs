use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::benchmarks::catalog::WorkloadParameter;

/// One timed fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// The iteration number (0-indexed)
    pub iteration: usize,
    /// The run within the iteration (0-indexed)
    pub run: usize,
    /// Duration in milliseconds
    pub duration_ms: f64,
}

/// Lifecycle stage a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Setup,
    Benchmark,
}

/// An iteration that lost one or more samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationFailure {
    pub iteration: usize,
    pub stage: FailureStage,
    pub message: String,
}

/// Per-iteration teardown outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationReport {
    pub iteration: usize,
    /// Whether teardown found the target repository metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_valid: Option<bool>,
    pub scratch_removed: bool,
}

/// Statistical summary of benchmark runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Minimum time in milliseconds
    pub min: f64,
    /// Maximum time in milliseconds
    pub max: f64,
    /// Mean time in milliseconds
    pub mean: f64,
    /// Median time in milliseconds
    pub median: f64,
    /// Standard deviation in milliseconds
    pub std_dev: f64,
}

/// Complete results for one workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub parameter: WorkloadParameter,
    /// Recorded samples
    pub runs: Vec<RunResult>,
    /// Iterations that lost samples
    pub failures: Vec<IterationFailure>,
    /// Teardown outcome of every iteration
    pub iterations: Vec<IterationReport>,
    /// Statistical summary of `runs`
    pub summary: RunSummary,
}

/// How one implementation compares against the fastest for a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedComparison {
    pub implementation: String,
    /// How many times slower than the fastest implementation
    pub times_slower: f64,
    /// Standard error of `times_slower`
    pub error: f64,
}

/// Implementations of one repository ranked against each other
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryComparison {
    pub repository: String,
    pub fastest_implementation: String,
    pub fastest_mean_ms: f64,
    /// Slowest first
    pub comparisons: Vec<SpeedComparison>,
}

/// Functions for analyzing benchmark results
pub struct ResultAnalyzer;

impl ResultAnalyzer {
    /// Calculate a statistical summary for benchmark run results
    pub fn calculate_summary(results: &[RunResult]) -> RunSummary {
        let durations: Vec<f64> = results.iter().map(|r| r.duration_ms).collect();
        Self::calculate_summary_from_durations(&durations)
    }

    /// Calculate statistical summary from duration values
    pub fn calculate_summary_from_durations(durations: &[f64]) -> RunSummary {
        if durations.is_empty() {
            return RunSummary::default();
        }

        let mut sorted = durations.to_vec();
        sorted.sort_by(f64::total_cmp);

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let mean = durations.iter().sum::<f64>() / durations.len() as f64;

        let median = if sorted.len() % 2 == 0 {
            let mid = sorted.len() / 2;
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[sorted.len() / 2]
        };

        let variance: f64 = durations
            .iter()
            .map(|d| {
                let diff = d - mean;
                diff * diff
            })
            .sum::<f64>()
            / durations.len() as f64;
        let std_dev = variance.sqrt();

        RunSummary {
            min,
            max,
            mean,
            median,
            std_dev,
        }
    }

    /// Rank the implementations of each repository by mean fetch time.
    ///
    /// Workloads without samples are left out; repositories keep the order
    /// in which they first appear.
    pub fn compare_implementations(results: &[BenchmarkResult]) -> Vec<RepositoryComparison> {
        let mut order: Vec<&str> = Vec::new();
        let mut by_repository: BTreeMap<&str, Vec<&BenchmarkResult>> = BTreeMap::new();
        for result in results.iter().filter(|r| !r.runs.is_empty()) {
            let repository = result.parameter.repository.as_str();
            if !by_repository.contains_key(repository) {
                order.push(repository);
            }
            by_repository.entry(repository).or_default().push(result);
        }

        order
            .into_iter()
            .filter_map(|repository| {
                let group = by_repository.get(repository)?;
                let fastest = group
                    .iter()
                    .min_by(|a, b| a.summary.mean.total_cmp(&b.summary.mean))?;
                let fastest_mean = fastest.summary.mean;

                let mut comparisons: Vec<SpeedComparison> = group
                    .iter()
                    .filter(|r| !std::ptr::eq(**r, *fastest))
                    .map(|result| {
                        let times_slower = result.summary.mean / fastest_mean;

                        // Simple error propagation (approximate)
                        let relative_error_squared = (fastest.summary.std_dev / fastest_mean)
                            .powi(2)
                            + (result.summary.std_dev / result.summary.mean).powi(2);
                        let error = times_slower * relative_error_squared.sqrt();

                        SpeedComparison {
                            implementation: result.parameter.implementation.clone(),
                            times_slower,
                            error,
                        }
                    })
                    .collect();
                comparisons.sort_by(|a, b| b.times_slower.total_cmp(&a.times_slower));

                Some(RepositoryComparison {
                    repository: repository.to_string(),
                    fastest_implementation: fastest.parameter.implementation.clone(),
                    fastest_mean_ms: fastest_mean,
                    comparisons,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(implementation: &str, repository: &str, durations: &[f64]) -> BenchmarkResult {
        let runs: Vec<RunResult> = durations
            .iter()
            .enumerate()
            .map(|(i, d)| RunResult {
                iteration: i,
                run: 0,
                duration_ms: *d,
            })
            .collect();
        BenchmarkResult {
            parameter: WorkloadParameter::new(implementation, repository),
            summary: ResultAnalyzer::calculate_summary(&runs),
            runs,
            failures: Vec::new(),
            iterations: Vec::new(),
        }
    }

    #[test]
    fn test_calculate_summary() {
        let summary = ResultAnalyzer::calculate_summary_from_durations(&[300.0, 100.0, 200.0]);
        assert_eq!(summary.min, 100.0);
        assert_eq!(summary.max, 300.0);
        assert_eq!(summary.mean, 200.0);
        assert_eq!(summary.median, 200.0);
        assert!(summary.std_dev > 0.0);

        let even = ResultAnalyzer::calculate_summary_from_durations(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(even.median, 2.5);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(ResultAnalyzer::calculate_summary(&[]), RunSummary::default());
    }

    #[test]
    fn test_compare_implementations() {
        let results = vec![
            result("git", "small.git", &[10.0, 10.0]),
            result("libgit2", "small.git", &[20.0, 20.0]),
            result("git", "large.git", &[300.0]),
            result("libgit2", "large.git", &[100.0]),
            result("libgit2", "broken.git", &[]),
        ];

        let comparisons = ResultAnalyzer::compare_implementations(&results);
        assert_eq!(comparisons.len(), 2);

        assert_eq!(comparisons[0].repository, "small.git");
        assert_eq!(comparisons[0].fastest_implementation, "git");
        assert_eq!(comparisons[0].comparisons.len(), 1);
        assert_eq!(comparisons[0].comparisons[0].implementation, "libgit2");
        assert_eq!(comparisons[0].comparisons[0].times_slower, 2.0);
        assert_eq!(comparisons[0].comparisons[0].error, 0.0);

        assert_eq!(comparisons[1].repository, "large.git");
        assert_eq!(comparisons[1].fastest_implementation, "libgit2");
        assert_eq!(comparisons[1].comparisons[0].times_slower, 3.0);
    }
}
