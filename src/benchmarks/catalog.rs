use serde::{Deserialize, Serialize};
use std::fmt;

use crate::benchmarks::parameter::{ParameterList, ParameterMatrix};
use crate::error::BenchError;

/// Matrix variable holding the implementation name
pub const IMPLEMENTATION_VAR: &str = "implementation";
/// Matrix variable holding the repository source URL
pub const REPOSITORY_VAR: &str = "repository";

/// Repositories of increasing history size.
///
/// java-logging-benchmarks is tens of KiB, coreutils a few MiB, cairo around
/// a hundred MiB and samba several hundred MiB.
pub const DEFAULT_REPOSITORIES: [&str; 4] = [
    "https://github.com/stephenc/java-logging-benchmarks.git",
    "https://github.com/uutils/coreutils.git",
    "https://github.com/freedesktop/cairo.git",
    "https://github.com/samba-team/samba.git",
];

/// Git client implementations that can be benchmarked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Implementation {
    /// The `git` executable
    Git,
    /// libgit2 linked into the process
    Libgit2,
}

impl Implementation {
    pub const ALL: [Implementation; 2] = [Implementation::Git, Implementation::Libgit2];

    pub fn name(&self) -> &'static str {
        match self {
            Implementation::Git => "git",
            Implementation::Libgit2 => "libgit2",
        }
    }

    /// Resolve an implementation name; unknown names are configuration errors
    pub fn from_name(name: &str) -> Result<Self, BenchError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "git" | "cli" => Ok(Implementation::Git),
            "libgit2" | "git2" => Ok(Implementation::Libgit2),
            _ => Err(BenchError::configuration(format!(
                "unknown git implementation '{name}' (expected one of: {})",
                Self::ALL.map(|i| i.name()).join(", ")
            ))),
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One cell of the benchmark matrix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadParameter {
    pub implementation: String,
    pub repository: String,
}

impl WorkloadParameter {
    pub fn new(implementation: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
            repository: repository.into(),
        }
    }
}

impl fmt::Display for WorkloadParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.implementation, self.repository)
    }
}

pub fn default_implementations() -> Vec<String> {
    Implementation::ALL
        .iter()
        .map(|i| i.name().to_string())
        .collect()
}

pub fn default_repositories() -> Vec<String> {
    DEFAULT_REPOSITORIES.iter().map(|r| r.to_string()).collect()
}

/// Replace aliases by canonical implementation names and drop duplicates.
/// Unknown names are kept so their workloads fail on their own.
fn canonical_implementations(names: &[String]) -> Vec<String> {
    let mut canonical: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = Implementation::from_name(name)
            .map(|i| i.name().to_string())
            .unwrap_or_else(|_| name.trim().to_string());
        if !canonical.contains(&name) {
            canonical.push(name);
        }
    }
    canonical
}

/// Cross product of repositories and implementations, grouped by repository
pub fn workload_matrix(implementations: &[String], repositories: &[String]) -> Vec<WorkloadParameter> {
    let implementations = canonical_implementations(implementations);
    let matrix = ParameterMatrix::new(&[
        ParameterList {
            var: REPOSITORY_VAR.to_string(),
            values: repositories.to_vec(),
        },
        ParameterList {
            var: IMPLEMENTATION_VAR.to_string(),
            values: implementations,
        },
    ]);
    matrix.workloads()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Implementation::from_name("git").unwrap(), Implementation::Git);
        assert_eq!(Implementation::from_name("CLI").unwrap(), Implementation::Git);
        assert_eq!(
            Implementation::from_name(" libgit2 ").unwrap(),
            Implementation::Libgit2
        );
        assert_eq!(
            Implementation::from_name("git2").unwrap(),
            Implementation::Libgit2
        );

        let err = Implementation::from_name("jgit").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("jgit"));
    }

    #[test]
    fn test_default_matrix() {
        let matrix = workload_matrix(&default_implementations(), &default_repositories());
        assert_eq!(matrix.len(), 8);
        assert_eq!(
            matrix[0],
            WorkloadParameter::new("git", DEFAULT_REPOSITORIES[0])
        );
        assert_eq!(
            matrix[1],
            WorkloadParameter::new("libgit2", DEFAULT_REPOSITORIES[0])
        );
        assert_eq!(
            matrix[7],
            WorkloadParameter::new("libgit2", DEFAULT_REPOSITORIES[3])
        );
    }

    #[test]
    fn test_aliases_collapse_to_one_workload() {
        let names = ["git", "cli", "GIT2", "jgit", "libgit2"].map(String::from);
        let matrix = workload_matrix(&names, &["a.git".to_string()]);
        let implementations: Vec<_> = matrix.iter().map(|p| p.implementation.as_str()).collect();
        assert_eq!(implementations, ["git", "libgit2", "jgit"]);
    }

    #[test]
    fn test_empty_axis_gives_empty_matrix() {
        assert!(workload_matrix(&[], &default_repositories()).is_empty());
    }
}
