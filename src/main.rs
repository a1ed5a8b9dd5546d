use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use fetchbench::{
    benchmarks::MainRunner,
    config::{load_or_default, MergeableConfiguration, RunOverrides},
};
use log::{error, info};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "fetchbench.yml";
const DEFAULT_OUT_DIR: &str = "fetchbench-results";

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Compare git fetch performance of the git executable and libgit2"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Benchmark config (defaults to the built-in catalog when absent)
    #[arg(short, long, env = "FETCHBENCH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the benchmark matrix
    Run {
        /// Implementation to benchmark (repeatable)
        #[arg(short, long = "implementation")]
        implementations: Vec<String>,

        /// Repository source to benchmark (repeatable)
        #[arg(short, long = "repository")]
        repositories: Vec<String>,

        /// Measured iterations per workload
        #[arg(long)]
        iterations: Option<usize>,

        /// Unmeasured iterations per workload
        #[arg(long)]
        warmup: Option<usize>,

        /// Timed fetches per iteration
        #[arg(long)]
        runs: Option<usize>,

        /// Directory for per-iteration scratch trees
        #[arg(long)]
        scratch_dir: Option<PathBuf>,

        /// Directory results are written to; must be empty
        #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
    },
    /// Print the benchmark matrix
    List,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = load_or_default(&config_path, cli.config.is_some())?;

    match cli.command {
        Commands::Run {
            implementations,
            repositories,
            iterations,
            warmup,
            runs,
            scratch_dir,
            out_dir,
        } => {
            let config = config.merge_with(&RunOverrides {
                implementations,
                repositories,
                iterations,
                warmup,
                runs_per_iteration: runs,
                scratch_dir,
            })?;

            let runner = MainRunner::new(config, out_dir)?;
            let report = runner.run()?;

            for failure in &report.failed_configurations {
                error!("{} was not benchmarked: {}", failure.parameter, failure.message);
            }
            info!(
                "Benchmarked {} of {} workloads",
                report.results.len(),
                report.results.len() + report.failed_configurations.len()
            );
        }
        Commands::List => {
            for parameter in config.workloads() {
                println!("{}\t{}", parameter.implementation, parameter.repository);
            }
        }
    }

    Ok(())
}
