use git2::Repository;
use log::{debug, info};
use std::path::{Path, PathBuf};
use url::Url;

use crate::benchmarks::backend::GitClient;
use crate::error::BenchError;

const FALLBACK_NAME: &str = "repository";

/// A provisioned repository on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    /// Directory the repository lives in
    pub dir: PathBuf,
    /// Metadata directory reported by the backend
    pub git_dir: PathBuf,
}

/// Derive a filesystem-safe directory name from a repository source.
///
/// Query strings, fragments and trailing slashes are ignored. For scp-like
/// sources (`git@host:org/repo.git`) the part after the last `/` or `:` is
/// used.
pub fn repo_dir_name(source: &str) -> String {
    let trimmed = source.trim();

    let path = match Url::parse(trimmed) {
        Ok(url) if url.scheme().len() > 1 => url.path().to_string(),
        // Single-letter schemes are Windows drive letters, not URLs
        _ => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or_default();

    let sanitized: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        _ => sanitized,
    }
}

/// First non-existing `name`, `name-1`, `name-2`, ... under `parent`
fn unique_child(parent: &Path, name: &str) -> PathBuf {
    let candidate = parent.join(name);
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| parent.join(format!("{name}-{n}")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Make a relative local path source absolute so every backend resolves it
/// against the process working directory. URLs and scp-like sources are
/// returned unchanged.
pub fn clone_source(source: &str) -> Result<String, BenchError> {
    let trimmed = source.trim();
    let is_url = matches!(Url::parse(trimmed), Ok(url) if url.scheme().len() > 1);
    let is_scp_like = trimmed
        .split_once(':')
        .is_some_and(|(host, _)| !host.is_empty() && !host.contains(['/', '\\']));

    if is_url || is_scp_like || Path::new(trimmed).is_absolute() {
        return Ok(trimmed.to_string());
    }

    let absolute = std::path::absolute(trimmed)
        .map_err(|e| BenchError::provisioning(format!("Failed to resolve {trimmed}"), e))?;
    debug!("Resolved local source {trimmed} to {}", absolute.display());
    Ok(absolute.to_string_lossy().into_owned())
}

/// Number of local branches in the repository at `dir`
fn branch_count(dir: &Path) -> Result<usize, git2::Error> {
    let repo = Repository::open(dir)?;
    let mut refs = repo.references_glob("refs/heads/*")?;
    Ok(refs.names().count())
}

/// Create `upstream_dir` and clone `source` into it using `client`.
///
/// `client` must be bound to `upstream_dir`; [`upstream_dir`] computes the
/// directory from the source. A clone without any branch is rejected.
pub fn provision_upstream(
    upstream_dir: &Path,
    source: &str,
    client: &dyn GitClient,
) -> Result<RepositoryHandle, BenchError> {
    std::fs::create_dir(upstream_dir).map_err(|e| {
        BenchError::provisioning(
            format!("Failed to create directory: {}", upstream_dir.display()),
            e,
        )
    })?;

    let source = clone_source(source)?;
    info!(
        "Cloning repository: {source} to {} ({})",
        upstream_dir.display(),
        client.implementation()
    );
    client
        .clone_into(&source)
        .map_err(|e| BenchError::provisioning(format!("Failed to clone {source}"), e))?;

    let git_dir = client.git_dir().map_err(|e| {
        BenchError::provisioning("unable to create local repository", e)
    })?;
    let branches = branch_count(upstream_dir).map_err(|e| {
        BenchError::provisioning(
            format!("unable to inspect local repository {}", upstream_dir.display()),
            e,
        )
    })?;
    if branches == 0 {
        return Err(BenchError::provisioning_msg(format!(
            "unable to create local repository: {} has no branches",
            upstream_dir.display()
        )));
    }
    debug!("Upstream {} holds {branches} branches", upstream_dir.display());

    Ok(RepositoryHandle {
        dir: upstream_dir.to_path_buf(),
        git_dir,
    })
}

/// Directory the upstream clone of `source` will occupy under `parent_dir`
pub fn upstream_dir(parent_dir: &Path, source: &str) -> PathBuf {
    unique_child(parent_dir, &repo_dir_name(source))
}

/// Create the empty repository that fetches are measured into
pub fn initialize_target(dir: &Path, client: &dyn GitClient) -> Result<RepositoryHandle, BenchError> {
    client.init().map_err(|e| {
        BenchError::provisioning(format!("Failed to initialize {}", dir.display()), e)
    })?;
    let git_dir = client.git_dir().map_err(|e| {
        BenchError::provisioning(format!("No repository after init in {}", dir.display()), e)
    })?;
    debug!("Initialized target repository {}", git_dir.display());

    Ok(RepositoryHandle {
        dir: dir.to_path_buf(),
        git_dir,
    })
}
