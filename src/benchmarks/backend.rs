use anyhow::{Context, Result};
use git2::{AutotagOption, FetchOptions, Repository};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

use crate::benchmarks::catalog::Implementation;
use crate::benchmarks::refspec::RefSpec;
use crate::command::CommandExecutor;
use crate::error::BenchError;

const MIRROR_HEADS: &str = "+refs/heads/*:refs/heads/*";
const MIRROR_TAGS: &str = "+refs/tags/*:refs/tags/*";

/// Operations every benchmarked git client offers.
///
/// A client is bound to one working directory for its whole lifetime.
pub trait GitClient: Send {
    /// Which implementation backs this client
    fn implementation(&self) -> Implementation;

    /// Directory the client operates in
    fn working_dir(&self) -> &Path;

    /// Create an empty repository in the working directory
    fn init(&self) -> Result<()>;

    /// Clone `url` into the working directory with every branch of the
    /// source available as a local branch
    fn clone_into(&self, url: &str) -> Result<()>;

    /// Fetch `refspecs` from `source` into the repository in the working directory
    fn fetch(&self, source: &Url, refspecs: &[RefSpec]) -> Result<()>;

    /// Locate the metadata directory of the repository in the working directory
    fn git_dir(&self) -> Result<PathBuf>;
}

/// Resolve an implementation name to a client bound to `working_dir`
pub fn resolve(
    name: &str,
    working_dir: &Path,
    env: &HashMap<String, String>,
) -> Result<Box<dyn GitClient>, BenchError> {
    let implementation = Implementation::from_name(name)?;
    Ok(client_for(implementation, working_dir, env))
}

/// Build a client for an already resolved implementation
pub fn client_for(
    implementation: Implementation,
    working_dir: &Path,
    env: &HashMap<String, String>,
) -> Box<dyn GitClient> {
    debug!(
        "Using {implementation} client in {}",
        working_dir.display()
    );
    match implementation {
        Implementation::Git => Box::new(CliGitClient::new(working_dir, env.clone())),
        Implementation::Libgit2 => {
            Box::new(Libgit2Client::new(working_dir).with_env(env.clone()))
        }
    }
}

/// Client driving the `git` executable
#[derive(Debug, Clone)]
pub struct CliGitClient {
    working_dir: PathBuf,
    env: HashMap<String, String>,
}

impl CliGitClient {
    pub fn new(working_dir: &Path, env: HashMap<String, String>) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            env,
        }
    }

    fn executor(&self) -> CommandExecutor {
        CommandExecutor::builder()
            .working_dir(Some(&self.working_dir))
            .env_var("GIT_TERMINAL_PROMPT", "0")
            .env_vars(self.env.clone())
            .build()
    }

    /// Version string reported by the `git` executable
    pub fn version() -> Result<String> {
        CommandExecutor::builder()
            .build()
            .stdout_of("git", &["--version"])
    }
}

impl GitClient for CliGitClient {
    fn implementation(&self) -> Implementation {
        Implementation::Git
    }

    fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn init(&self) -> Result<()> {
        self.executor()
            .execute_command_with_args("git", &["init", "--quiet"])
            .with_context(|| format!("git init failed in {}", self.working_dir.display()))?;
        Ok(())
    }

    fn clone_into(&self, url: &str) -> Result<()> {
        self.executor()
            .execute_command_with_args("git", &["clone", "--mirror", "--quiet", url, "."])
            .with_context(|| format!("Failed to clone repository: {url}"))?;
        Ok(())
    }

    fn fetch(&self, source: &Url, refspecs: &[RefSpec]) -> Result<()> {
        let specs: Vec<String> = refspecs.iter().map(ToString::to_string).collect();
        let mut args = vec!["fetch", "--quiet", "--no-tags", source.as_str()];
        args.extend(specs.iter().map(String::as_str));

        self.executor()
            .execute_command_with_args("git", &args)
            .with_context(|| format!("git fetch from {source} failed"))?;
        Ok(())
    }

    fn git_dir(&self) -> Result<PathBuf> {
        let mut executor = CommandExecutor::builder()
            .working_dir(Some(&self.working_dir))
            .env_vars(self.env.clone());
        // Do not walk up into an enclosing repository
        if let Some(parent) = self.working_dir.parent() {
            executor = executor.env_var(
                "GIT_CEILING_DIRECTORIES",
                parent.to_string_lossy().into_owned(),
            );
        }

        let dir = executor
            .build()
            .stdout_of("git", &["rev-parse", "--absolute-git-dir"])
            .with_context(|| {
                format!(
                    "No git repository found in {}",
                    self.working_dir.display()
                )
            })?;
        Ok(PathBuf::from(dir))
    }
}

/// Client using libgit2 in-process.
///
/// libgit2 runs inside this process and reads no per-call environment, so
/// the bound environment is kept for reporting only.
#[derive(Debug, Clone)]
pub struct Libgit2Client {
    working_dir: PathBuf,
    env: HashMap<String, String>,
}

impl Libgit2Client {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            env: HashMap::new(),
        }
    }

    /// Bind the environment the other clients would run with
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    fn log_ignored_env(&self) {
        if !self.env.is_empty() {
            let mut keys: Vec<_> = self.env.keys().map(String::as_str).collect();
            keys.sort_unstable();
            debug!("libgit2 ignores bound environment: {}", keys.join(", "));
        }
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.working_dir).with_context(|| {
            format!(
                "No git repository found in {}",
                self.working_dir.display()
            )
        })
    }

    /// Version of the linked libgit2
    pub fn version() -> String {
        let (major, minor, patch) = git2::Version::get().libgit2_version();
        format!("libgit2 {major}.{minor}.{patch}")
    }
}

impl GitClient for Libgit2Client {
    fn implementation(&self) -> Implementation {
        Implementation::Libgit2
    }

    fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn init(&self) -> Result<()> {
        Repository::init(&self.working_dir).with_context(|| {
            format!("libgit2 init failed in {}", self.working_dir.display())
        })?;
        Ok(())
    }

    fn clone_into(&self, url: &str) -> Result<()> {
        self.log_ignored_env();
        let repo = Repository::init_bare(&self.working_dir)
            .with_context(|| format!("Failed to create {}", self.working_dir.display()))?;
        repo.remote_with_fetch("origin", url, MIRROR_HEADS)?;
        repo.remote_add_fetch("origin", MIRROR_TAGS)?;

        let mut remote = repo.find_remote("origin")?;
        let mut options = FetchOptions::new();
        options.download_tags(AutotagOption::All);
        remote
            .fetch(&[] as &[&str], Some(&mut options), None)
            .with_context(|| format!("Failed to clone repository: {url}"))?;

        // Point HEAD at the source's default branch when it advertised one
        if let Ok(head) = remote.default_branch() {
            if let Some(head) = head.as_str() {
                repo.set_head(head)?;
            }
        }
        Ok(())
    }

    fn fetch(&self, source: &Url, refspecs: &[RefSpec]) -> Result<()> {
        self.log_ignored_env();
        let repo = self.open()?;
        let mut remote = repo.remote_anonymous(source.as_str())?;
        let specs: Vec<String> = refspecs.iter().map(ToString::to_string).collect();

        let mut options = FetchOptions::new();
        options.download_tags(AutotagOption::None);
        remote
            .fetch(&specs, Some(&mut options), None)
            .with_context(|| format!("libgit2 fetch from {source} failed"))?;
        Ok(())
    }

    fn git_dir(&self) -> Result<PathBuf> {
        Ok(self.open()?.path().to_path_buf())
    }
}
