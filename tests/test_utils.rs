#![allow(dead_code)]

use git2::{Repository, Signature};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A source repository on local disk that benchmarks clone from
pub struct FixtureRepo {
    _dir: TempDir,
    path: PathBuf,
}

impl FixtureRepo {
    /// Create a repository whose only branches are `branches`; each branch
    /// points at its own commit on top of a shared root commit and HEAD
    /// points at the first one.
    pub fn with_branches(branches: &[&str]) -> Self {
        let dir = TempDir::new().expect("failed to create fixture dir");
        let path = dir.path().join("source");
        let repo = Repository::init(&path).expect("failed to init fixture");
        let sig = Signature::now("Bench Author", "bench@example.com").unwrap();

        std::fs::write(path.join("README"), "fixture\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let root = repo
            .find_commit(repo.commit(None, &sig, &sig, "root", &tree, &[]).unwrap())
            .unwrap();

        for name in branches {
            let oid = repo
                .commit(None, &sig, &sig, &format!("work on {name}"), &tree, &[&root])
                .unwrap();
            let commit = repo.find_commit(oid).unwrap();
            repo.branch(name, &commit, false).unwrap();
        }
        if let Some(first) = branches.first() {
            repo.set_head(&format!("refs/heads/{first}")).unwrap();
        }

        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Names of the references under `prefix` in the repository at `dir`
pub fn refs_under(dir: &Path, prefix: &str) -> BTreeSet<String> {
    let repo = Repository::open(dir).expect("not a repository");
    let mut refs = repo
        .references_glob(&format!("{prefix}*"))
        .expect("failed to list references");
    refs.names().map(|name| name.unwrap().to_string()).collect()
}

/// Whether a `git` executable is installed
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Implementations testable on this machine
pub fn implementations() -> Vec<&'static str> {
    let mut names = vec!["libgit2"];
    if git_available() {
        names.push("git");
    } else {
        eprintln!("git executable not found, only testing libgit2");
    }
    names
}

pub fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
