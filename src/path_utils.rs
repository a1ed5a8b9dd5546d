use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Expand `~` and environment variables in a path string
pub fn expand_path_str(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| path.into())
        .into_owned()
}

/// Expand `~` and environment variables in a path
pub fn expand_path_buf(path: &Path) -> PathBuf {
    PathBuf::from(expand_path_str(&path.to_string_lossy()))
}

/// Create a directory and all parent directories if they don't exist
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {path:?}"))?;
        debug!("Created directory: {path:?}");
    }
    Ok(())
}

/// Expand `path`, make it absolute relative to `base_dir`, create it and
/// return its canonical form
pub fn resolve_directory(path: &Path, base_dir: &Path) -> Result<PathBuf> {
    let expanded = expand_path_buf(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    };

    ensure_directory(&absolute)?;
    absolute
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {absolute:?}"))
}

/// Make sure `dir` exists and holds no earlier results
pub fn prepare_output_directory(dir: &Path) -> Result<()> {
    ensure_directory(dir)?;

    if std::fs::read_dir(dir)?.next().is_some() {
        anyhow::bail!(
            "Output directory '{}' is not empty. Please clear it before running benchmarks",
            dir.display()
        );
    }

    Ok(())
}

/// Copy a file with better error handling
pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    std::fs::copy(source, dest)
        .with_context(|| format!("Failed to copy {source:?} to {dest:?}"))?;
    debug!("Copied {source:?} to {dest:?}");
    Ok(())
}
