use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::benchmarks::catalog::{
    default_implementations, default_repositories, workload_matrix, Implementation,
    WorkloadParameter,
};
use crate::benchmarks::refspec::{RefSpec, ALL_BRANCHES};
use crate::benchmarks::state::SetupOptions;
use crate::config::traits::{Configuration, MergeableConfiguration, PathConfiguration};
use crate::path_utils;

fn default_iterations() -> usize {
    5
}

fn default_runs_per_iteration() -> usize {
    1
}

fn default_refspecs() -> Vec<String> {
    vec![ALL_BRANCHES.to_string()]
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Benchmark configuration, usually loaded from `fetchbench.yml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Implementation names to benchmark
    #[serde(default = "default_implementations")]
    pub implementations: Vec<String>,
    /// Repository sources to benchmark
    #[serde(default = "default_repositories")]
    pub repositories: Vec<String>,
    /// Measured iterations per workload
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Unmeasured iterations per workload
    #[serde(default)]
    pub warmup: usize,
    /// Timed fetches per iteration
    #[serde(default = "default_runs_per_iteration")]
    pub runs_per_iteration: usize,
    /// Ref-specs every fetch requests
    #[serde(default = "default_refspecs")]
    pub refspecs: Vec<String>,
    /// Where per-iteration scratch trees are created
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Extra environment for the `git` executable
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Path to the config file (set during loading)
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            implementations: default_implementations(),
            repositories: default_repositories(),
            iterations: default_iterations(),
            warmup: 0,
            runs_per_iteration: default_runs_per_iteration(),
            refspecs: default_refspecs(),
            scratch_dir: default_scratch_dir(),
            env: HashMap::new(),
            path: None,
        }
    }
}

impl BenchConfig {
    /// Parsed ref-specs
    pub fn ref_specs(&self) -> Result<Vec<RefSpec>> {
        self.refspecs.iter().map(|s| RefSpec::parse(s)).collect()
    }

    /// Options handed to every iteration's setup
    pub fn setup_options(&self) -> Result<SetupOptions> {
        Ok(SetupOptions {
            scratch_base: self.scratch_dir.clone(),
            refspecs: self.ref_specs()?,
            env: self.env.clone(),
        })
    }

    /// The benchmark matrix
    pub fn workloads(&self) -> Vec<WorkloadParameter> {
        workload_matrix(&self.implementations, &self.repositories)
    }
}

impl Configuration for BenchConfig {
    fn config_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn config_type(&self) -> &str {
        "benchmark"
    }

    fn validate(&self) -> Result<()> {
        if self.implementations.is_empty() {
            anyhow::bail!("No implementations configured");
        }
        if self.repositories.is_empty() {
            anyhow::bail!("No repositories configured");
        }
        if let Some(blank) = self.repositories.iter().find(|r| r.trim().is_empty()) {
            anyhow::bail!("Invalid repository source: {blank:?}");
        }
        if self.iterations == 0 {
            anyhow::bail!("iterations must be at least 1");
        }
        if self.runs_per_iteration == 0 {
            anyhow::bail!("runs_per_iteration must be at least 1");
        }
        if self.refspecs.is_empty() {
            anyhow::bail!("No ref-specs configured");
        }
        self.ref_specs().context("Invalid ref-spec in configuration")?;

        // Unknown implementations only fail their own workloads
        for name in &self.implementations {
            if let Err(e) = Implementation::from_name(name) {
                warn!("{e}");
            }
        }

        Ok(())
    }
}

impl PathConfiguration for BenchConfig {
    fn with_expanded_paths(&self, config_dir: &Path) -> Result<Self> {
        let mut config = self.clone();
        config.scratch_dir = path_utils::resolve_directory(&config.scratch_dir, config_dir)?;
        Ok(config)
    }
}

/// Values given on the command line; set values replace the file's
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub implementations: Vec<String>,
    pub repositories: Vec<String>,
    pub iterations: Option<usize>,
    pub warmup: Option<usize>,
    pub runs_per_iteration: Option<usize>,
    pub scratch_dir: Option<PathBuf>,
}

impl MergeableConfiguration<RunOverrides> for BenchConfig {
    fn merge_with(&self, other: &RunOverrides) -> Result<Self> {
        let mut config = self.clone();
        if !other.implementations.is_empty() {
            config.implementations = other.implementations.clone();
        }
        if !other.repositories.is_empty() {
            config.repositories = other.repositories.clone();
        }
        config.iterations = other.iterations.unwrap_or(config.iterations);
        config.warmup = other.warmup.unwrap_or(config.warmup);
        config.runs_per_iteration = other.runs_per_iteration.unwrap_or(config.runs_per_iteration);
        if let Some(scratch_dir) = &other.scratch_dir {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            config.scratch_dir = path_utils::resolve_directory(scratch_dir, &cwd)?;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Load benchmark configuration from a YAML file
pub fn load_bench_config(path: &Path) -> Result<BenchConfig> {
    if !path.exists() {
        anyhow::bail!("Benchmark config file not found: {:?}", path);
    }

    let config_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().context("Failed to get current directory")?,
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read benchmark config file: {:?}", path))?;

    let mut config: BenchConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse YAML from file: {:?}", path))?;
    config.path = Some(path.to_path_buf());

    let config = config.with_expanded_paths(&config_dir)?;
    config.validate()?;

    debug!("Using {} configuration\n{:?}", config.config_type(), config);
    Ok(config)
}

/// Load `path` when it exists; otherwise fall back to the built-in catalog
/// unless the file was requested explicitly
pub fn load_or_default(path: &Path, explicit: bool) -> Result<BenchConfig> {
    if path.exists() || explicit {
        return load_bench_config(path);
    }

    debug!("No config file at {:?}, using the built-in catalog", path);
    let config = BenchConfig::default();
    config.validate()?;
    Ok(config)
}
