//! Atomic file output
//!
//! Every output is rendered in memory first and written through a
//! temporary file in the destination directory, so a failed run never
//! leaves a half-written target behind.

use crate::error::{Error, Result};
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Output bytes written to a temporary file next to their target
///
/// Dropping a staged file without committing removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    path: PathBuf,
    len: usize,
}

impl StagedFile {
    /// Target path the staged bytes will replace
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the staged bytes over the target in one rename
    pub fn commit(self) -> Result<()> {
        let StagedFile { temp, path, len } = self;
        temp.persist(&path).map_err(|e| Error::FileWrite {
            path: path.clone(),
            source: e.error,
        })?;

        info!("Wrote {} ({} bytes)", path.display(), len);
        Ok(())
    }
}

/// Write `bytes` to a synced temporary file in the directory of `path`
pub fn stage_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<StagedFile> {
    let path = path.as_ref();
    let write_error = |source: std::io::Error| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        debug!("Creating parent directories: {}", dir.display());
        fs::create_dir_all(dir).map_err(write_error)?;
    }

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    debug!("Staged {} at {}", path.display(), temp.path().display());

    Ok(StagedFile {
        temp,
        path: path.to_path_buf(),
        len: bytes.len(),
    })
}

/// Write `bytes` to `path`, replacing any existing file in one step
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    stage_atomic(path, bytes)?.commit()
}
