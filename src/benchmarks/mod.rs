pub mod backend;
pub use backend::{resolve, CliGitClient, GitClient, Libgit2Client};
pub mod catalog;
pub use catalog::{Implementation, WorkloadParameter, DEFAULT_REPOSITORIES};
mod parameter;
pub use parameter::{ParameterList, ParameterMatrix};
pub mod provision;
pub use provision::{initialize_target, provision_upstream, repo_dir_name, RepositoryHandle};
pub mod refspec;
pub use refspec::RefSpec;
pub mod scratch;
pub use scratch::ScratchSpace;
pub mod state;
pub use state::{BenchmarkState, IterationPhase, SetupOptions, TeardownReport};
mod benchmark_runner;
pub use benchmark_runner::BenchmarkRunner;
mod results;
pub use results::{
    BenchmarkResult, FailureStage, IterationFailure, IterationReport, RepositoryComparison,
    ResultAnalyzer, RunResult, RunSummary, SpeedComparison,
};
mod export;
pub use export::ResultExporter;
mod runner;
pub use runner::{ConfigurationFailure, MainRunner, RunReport};
