use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::BenchError;

const SCRATCH_PREFIX: &str = "fetchbench-";
const FOLDER_PREFIX: &str = "folder";

/// Per-iteration scratch directory tree.
///
/// The root is uniquely named so concurrent iterations never share a tree.
/// It is removed by [`ScratchSpace::release`] or, failing that, when the
/// value is dropped.
#[derive(Debug)]
pub struct ScratchSpace {
    root: PathBuf,
    dir: Option<TempDir>,
    next_folder: usize,
}

impl ScratchSpace {
    /// Create a fresh scratch root inside `base`
    pub fn acquire(base: &Path) -> Result<Self, BenchError> {
        std::fs::create_dir_all(base).map_err(|e| {
            BenchError::provisioning(
                format!("Failed to create scratch base directory: {}", base.display()),
                e,
            )
        })?;

        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(base)
            .map_err(|e| {
                BenchError::provisioning(
                    format!("Failed to create scratch directory in {}", base.display()),
                    e,
                )
            })?;

        debug!("Acquired scratch space {}", dir.path().display());
        Ok(Self {
            root: dir.path().to_path_buf(),
            dir: Some(dir),
            next_folder: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_released(&self) -> bool {
        self.dir.is_none()
    }

    /// Create a new empty folder directly under the scratch root.
    ///
    /// Fails if the folder already exists.
    pub fn new_subdirectory(&mut self) -> Result<PathBuf, BenchError> {
        if self.is_released() {
            return Err(BenchError::provisioning_msg(format!(
                "Scratch space {} was already released",
                self.root.display()
            )));
        }

        let path = self
            .root
            .join(format!("{FOLDER_PREFIX}{}", self.next_folder));
        self.next_folder += 1;

        std::fs::create_dir(&path).map_err(|e| {
            BenchError::provisioning(format!("Failed to create directory: {}", path.display()), e)
        })?;
        debug!("Created directory: {}", path.display());
        Ok(path)
    }

    /// Remove the scratch tree. Calling this more than once, or after the
    /// tree was removed externally, only logs.
    pub fn release(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match dir.close() {
            Ok(()) => debug!("Released scratch space {}", self.root.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Scratch space {} was already removed", self.root.display())
            }
            Err(e) => warn!(
                "Failed to remove scratch space {}: {e}",
                self.root.display()
            ),
        }
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        self.release();
    }
}
