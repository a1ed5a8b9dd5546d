use crate::benchmarks::catalog::{WorkloadParameter, DEFAULT_REPOSITORIES};
use crate::benchmarks::refspec::RefSpec;
use crate::config::{
    load_bench_config, load_or_default, BenchConfig, Configuration, MergeableConfiguration,
    RunOverrides,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("fetchbench.yml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_defaults() {
    let config = BenchConfig::default();
    assert_eq!(config.implementations, vec!["git", "libgit2"]);
    assert_eq!(config.repositories.len(), DEFAULT_REPOSITORIES.len());
    assert_eq!(config.iterations, 5);
    assert_eq!(config.warmup, 0);
    assert_eq!(config.runs_per_iteration, 1);
    assert_eq!(config.ref_specs().unwrap(), vec![RefSpec::all_branches()]);
    assert!(config.validate().is_ok());
    assert_eq!(config.workloads().len(), 8);
}

#[test]
fn test_load_partial_file() {
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
implementations: [libgit2]
repositories:
  - https://github.com/uutils/coreutils.git
iterations: 2
scratch_dir: scratch
env:
  GIT_CONFIG_NOSYSTEM: "1"
"#,
    );

    let config = load_bench_config(&path).unwrap();
    assert_eq!(config.config_path(), Some(path.as_path()));
    assert_eq!(config.iterations, 2);
    assert_eq!(config.runs_per_iteration, 1);
    assert_eq!(config.refspecs, vec!["+refs/heads/*:refs/remotes/origin/*"]);
    assert_eq!(
        config.scratch_dir,
        dir.path().join("scratch").canonicalize().unwrap()
    );
    assert_eq!(config.env.get("GIT_CONFIG_NOSYSTEM"), Some(&"1".to_string()));
    assert_eq!(
        config.workloads(),
        vec![WorkloadParameter::new(
            "libgit2",
            "https://github.com/uutils/coreutils.git"
        )]
    );

    let options = config.setup_options().unwrap();
    assert_eq!(options.scratch_base, config.scratch_dir);
    assert_eq!(options.refspecs, vec![RefSpec::all_branches()]);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempdir().unwrap();
    for contents in [
        "iterations: 0\n",
        "runs_per_iteration: 0\n",
        "implementations: []\n",
        "repositories: []\n",
        "repositories: ['  ']\n",
        "refspecs: []\n",
        "refspecs: ['refs/heads/main']\n",
        "iterations: many\n",
    ] {
        let path = write_config(dir.path(), contents);
        assert!(load_bench_config(&path).is_err(), "accepted {contents:?}");
    }
}

#[test]
fn test_unknown_implementation_is_not_a_load_error() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "implementations: [git, jgit]\n");
    let config = load_bench_config(&path).unwrap();
    assert_eq!(config.implementations, vec!["git", "jgit"]);
}

#[test]
fn test_load_or_default() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("fetchbench.yml");

    let config = load_or_default(&missing, false).unwrap();
    assert!(config.config_path().is_none());
    assert_eq!(config.implementations.len(), 2);

    assert!(load_or_default(&missing, true).is_err());
}

#[test]
fn test_merge_overrides() {
    let base = BenchConfig::default();
    let overrides = RunOverrides {
        implementations: vec!["git".to_string()],
        repositories: vec!["/srv/git/small.git".to_string()],
        iterations: Some(10),
        warmup: Some(1),
        runs_per_iteration: None,
        scratch_dir: None,
    };

    let merged = base.merge_with(&overrides).unwrap();
    assert_eq!(merged.implementations, vec!["git"]);
    assert_eq!(merged.repositories, vec!["/srv/git/small.git"]);
    assert_eq!(merged.iterations, 10);
    assert_eq!(merged.warmup, 1);
    assert_eq!(merged.runs_per_iteration, 1);
    assert_eq!(merged.scratch_dir, base.scratch_dir);

    let invalid = RunOverrides {
        iterations: Some(0),
        ..RunOverrides::default()
    };
    assert!(base.merge_with(&invalid).is_err());
}

#[test]
fn test_merge_scratch_override_is_created() {
    let dir = tempdir().unwrap();
    let scratch = dir.path().join("iterations");
    let overrides = RunOverrides {
        scratch_dir: Some(scratch.clone()),
        ..RunOverrides::default()
    };

    let merged = BenchConfig::default().merge_with(&overrides).unwrap();
    assert!(scratch.is_dir());
    assert_eq!(merged.scratch_dir, scratch.canonicalize().unwrap());
}
