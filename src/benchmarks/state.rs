use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

use crate::benchmarks::backend::{self, GitClient};
use crate::benchmarks::catalog::{Implementation, WorkloadParameter};
use crate::benchmarks::provision;
use crate::benchmarks::refspec::RefSpec;
use crate::benchmarks::scratch::ScratchSpace;
use crate::error::BenchError;

/// Where an iteration is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationPhase {
    Idle,
    Provisioning,
    Initialized,
    Measuring,
    Verifying,
    Released,
}

/// Settings shared by every iteration of a configuration
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Directory the per-iteration scratch roots are created in
    pub scratch_base: PathBuf,
    /// What each fetch requests
    pub refspecs: Vec<RefSpec>,
    /// Extra environment for the git clients
    pub env: HashMap<String, String>,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            scratch_base: std::env::temp_dir(),
            refspecs: vec![RefSpec::all_branches()],
            env: HashMap::new(),
        }
    }
}

/// Outcome of [`BenchmarkState::teardown`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// Whether the target's metadata directory was found; `None` when setup
    /// never got as far as creating the target client
    pub target_valid: Option<bool>,
    pub scratch_root: PathBuf,
    pub scratch_removed: bool,
}

/// Everything one iteration owns: the scratch tree, the upstream clone, the
/// empty target repository and the client that fetches into it.
///
/// A state is built fresh for every iteration and consumed by
/// [`BenchmarkState::teardown`]. Dropping it without teardown still removes
/// the scratch tree.
pub struct BenchmarkState {
    parameter: WorkloadParameter,
    implementation: Implementation,
    phase: IterationPhase,
    scratch: ScratchSpace,
    target_dir: Option<PathBuf>,
    local_remote_dir: Option<PathBuf>,
    remote_repo_dir: Option<PathBuf>,
    client: Option<Box<dyn GitClient>>,
    ref_specs: Vec<RefSpec>,
    source_uri: Option<Url>,
}

impl BenchmarkState {
    /// Run the whole setup. On failure everything acquired so far is
    /// released before the error is returned.
    pub fn setup(parameter: &WorkloadParameter, options: &SetupOptions) -> Result<Self, BenchError> {
        let mut state = Self::acquire(parameter, options)?;
        if let Err(e) = state.provision(options) {
            warn!("Setup of {parameter} failed: {}", e.detailed());
            state.teardown();
            return Err(e);
        }
        info!("Do setup: {parameter}");
        Ok(state)
    }

    /// Resolve the implementation and create the scratch root.
    ///
    /// An unknown implementation fails before anything touches the filesystem.
    pub fn acquire(parameter: &WorkloadParameter, options: &SetupOptions) -> Result<Self, BenchError> {
        let implementation = Implementation::from_name(&parameter.implementation)?;
        let scratch = ScratchSpace::acquire(&options.scratch_base)?;

        Ok(Self {
            parameter: parameter.clone(),
            implementation,
            phase: IterationPhase::Idle,
            scratch,
            target_dir: None,
            local_remote_dir: None,
            remote_repo_dir: None,
            client: None,
            ref_specs: Vec::new(),
            source_uri: None,
        })
    }

    /// Clone the upstream, initialize the target and compute what to fetch
    pub fn provision(&mut self, options: &SetupOptions) -> Result<(), BenchError> {
        if self.phase != IterationPhase::Idle {
            return Err(BenchError::provisioning_msg(format!(
                "cannot provision a state in phase {:?}",
                self.phase
            )));
        }
        self.phase = IterationPhase::Provisioning;

        let target_dir = self.scratch.new_subdirectory()?;
        self.target_dir = Some(target_dir.clone());
        let local_remote_dir = self.scratch.new_subdirectory()?;
        self.local_remote_dir = Some(local_remote_dir.clone());

        let remote_repo_dir = provision::upstream_dir(&local_remote_dir, &self.parameter.repository);
        let cloning_client = backend::client_for(self.implementation, &remote_repo_dir, &options.env);
        let upstream = provision::provision_upstream(
            &remote_repo_dir,
            &self.parameter.repository,
            &*cloning_client,
        )?;
        self.remote_repo_dir = Some(upstream.dir.clone());

        let client = backend::client_for(self.implementation, &target_dir, &options.env);
        let client = self.client.insert(client);
        provision::initialize_target(&target_dir, &**client)?;

        let absolute = upstream.dir.canonicalize().map_err(|e| {
            BenchError::provisioning(format!("Failed to resolve {}", upstream.dir.display()), e)
        })?;
        let source_uri = Url::from_file_path(&absolute).map_err(|()| {
            BenchError::provisioning_msg(format!(
                "Cannot express {} as a file URI",
                absolute.display()
            ))
        })?;
        debug!("Fetch source for {}: {source_uri}", self.parameter);
        self.source_uri = Some(source_uri);

        self.ref_specs = if options.refspecs.is_empty() {
            vec![RefSpec::all_branches()]
        } else {
            options.refspecs.clone()
        };

        self.phase = IterationPhase::Initialized;
        Ok(())
    }

    /// The measured operation: fetch the ref-specs from the provisioned
    /// upstream into the target repository
    pub fn run_fetch(&mut self) -> Result<(), BenchError> {
        let (client, source_uri) = match (self.phase, &self.client, &self.source_uri) {
            (IterationPhase::Initialized | IterationPhase::Measuring, Some(client), Some(uri)) => {
                (client, uri)
            }
            _ => {
                return Err(BenchError::execution_msg(format!(
                    "fetch requested while the iteration is {:?}",
                    self.phase
                )))
            }
        };

        let result = client
            .fetch(source_uri, &self.ref_specs)
            .map_err(|e| BenchError::execution(format!("Failed to fetch from {source_uri}"), e));
        self.phase = IterationPhase::Measuring;
        result
    }

    /// Check the target repository and remove the scratch tree.
    ///
    /// Never fails: verification problems are logged and reported in the
    /// returned report, and the scratch tree is removed regardless.
    pub fn teardown(mut self) -> TeardownReport {
        self.phase = IterationPhase::Verifying;
        let target_valid = self.verify_target();

        let scratch_root = self.scratch.root().to_path_buf();
        self.scratch.release();
        self.phase = IterationPhase::Released;
        info!("Do teardown: {}", self.parameter);

        TeardownReport {
            target_valid,
            scratch_removed: !scratch_root.exists(),
            scratch_root,
        }
    }

    fn verify_target(&self) -> Option<bool> {
        let client = self.client.as_ref()?;
        match client.git_dir() {
            Ok(dir) => {
                let valid = dir.is_dir();
                info!("Target metadata {} is a directory: {valid}", dir.display());
                Some(valid)
            }
            Err(e) => {
                warn!(
                    "Unable to verify target repository in {}: {e:#}",
                    client.working_dir().display()
                );
                Some(false)
            }
        }
    }

    pub fn parameter(&self) -> &WorkloadParameter {
        &self.parameter
    }

    pub fn implementation(&self) -> Implementation {
        self.implementation
    }

    pub fn phase(&self) -> IterationPhase {
        self.phase
    }

    pub fn scratch_root(&self) -> &Path {
        self.scratch.root()
    }

    /// The repository fetches are measured into
    pub fn target_dir(&self) -> Option<&Path> {
        self.target_dir.as_deref()
    }

    /// The directory holding the upstream clone
    pub fn local_remote_dir(&self) -> Option<&Path> {
        self.local_remote_dir.as_deref()
    }

    /// The upstream clone fetched from
    pub fn remote_repo_dir(&self) -> Option<&Path> {
        self.remote_repo_dir.as_deref()
    }

    pub fn source_uri(&self) -> Option<&Url> {
        self.source_uri.as_ref()
    }

    pub fn ref_specs(&self) -> &[RefSpec] {
        &self.ref_specs
    }
}
