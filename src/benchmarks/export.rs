use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::benchmarks::provision::repo_dir_name;
use crate::benchmarks::results::{BenchmarkResult, RepositoryComparison, ResultAnalyzer};

/// Functions for exporting benchmark results
pub struct ResultExporter;

impl ResultExporter {
    /// Export all results to JSON, together with the per-repository comparison
    pub fn export_json(results: &[BenchmarkResult], path: &Path) -> Result<()> {
        #[derive(serde::Serialize)]
        struct ExportData<'a> {
            results: &'a [BenchmarkResult],
            comparisons: Vec<RepositoryComparison>,
        }

        let export_data = ExportData {
            results,
            comparisons: ResultAnalyzer::compare_implementations(results),
        };

        let json_data = serde_json::to_string_pretty(&export_data)
            .context("Failed to serialize benchmark results")?;

        std::fs::write(path, json_data)
            .with_context(|| format!("Failed to write benchmark results to {}", path.display()))?;

        Ok(())
    }

    /// File name of the CSV export for one workload
    pub fn csv_file_name(result: &BenchmarkResult) -> String {
        format!(
            "{}-{}.csv",
            result.parameter.implementation,
            repo_dir_name(&result.parameter.repository)
        )
    }

    /// Like [`Self::csv_file_name`], with a `-1`, `-2`, ... suffix when an
    /// earlier workload already took the name
    fn unique_csv_file_name(result: &BenchmarkResult, taken: &mut HashSet<String>) -> String {
        let base = Self::csv_file_name(result);
        let stem = base.trim_end_matches(".csv");
        let name = std::iter::once(base.clone())
            .chain((1..).map(|n| format!("{stem}-{n}.csv")))
            .find(|name| !taken.contains(name))
            .unwrap_or(base);
        taken.insert(name.clone());
        name
    }

    /// Export the samples of one workload to CSV
    pub fn export_csv(result: &BenchmarkResult, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writeln!(file, "iteration,run,duration_ms")?;
        for run in &result.runs {
            writeln!(file, "{},{},{:.3}", run.iteration, run.run, run.duration_ms)?;
        }

        writeln!(file)?;
        writeln!(file, "Summary:")?;
        writeln!(file, "min,{:.3}", result.summary.min)?;
        writeln!(file, "max,{:.3}", result.summary.max)?;
        writeln!(file, "mean,{:.3}", result.summary.mean)?;
        writeln!(file, "median,{:.3}", result.summary.median)?;
        writeln!(file, "std_dev,{:.3}", result.summary.std_dev)?;
        writeln!(file, "failures,{}", result.failures.len())?;

        Ok(())
    }

    /// Write `results.json` and one CSV per workload into `out_dir`
    pub fn export_all(results: &[BenchmarkResult], out_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(results.len() + 1);

        let json_path = out_dir.join("results.json");
        Self::export_json(results, &json_path)?;
        written.push(json_path);

        let mut taken = HashSet::new();
        for result in results {
            let csv_path = out_dir.join(Self::unique_csv_file_name(result, &mut taken));
            Self::export_csv(result, &csv_path)?;
            written.push(csv_path);
        }

        Ok(written)
    }
}
