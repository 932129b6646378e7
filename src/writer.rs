//! Persistence of rendered cards.
//!
//! The batch driver hands each encoded card to an [`ImageWriter`] by file
//! name only; where the bytes end up is the writer's business. [`FileWriter`]
//! stores them in one output directory, writing through a temp file so a
//! reader never sees a half-written JPEG.

use crate::cache::write_atomic;
use std::io;
use std::path::{Path, PathBuf};

pub trait ImageWriter: Send + Sync {
    /// Store `bytes` under `file_name`, replacing any previous file.
    fn save_file(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf>;

    /// Remove `file_name` if it exists. Failures are ignored.
    fn delete_file(&self, file_name: &str);
}

pub struct FileWriter {
    directory: PathBuf,
}

impl FileWriter {
    /// Creates `directory` (and parents) up front. A failure is logged; the
    /// first save will report it again.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        if let Err(e) = std::fs::create_dir_all(&directory) {
            tracing::error!(
                dir = %directory.display(),
                error = %e,
                "failed to create output directory"
            );
        }
        Self { directory }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ImageWriter for FileWriter {
    fn save_file(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.directory.join(file_name);
        write_atomic(&path, bytes)?;
        Ok(path)
    }

    fn delete_file(&self, file_name: &str) {
        let path = self.directory.join(file_name);
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "deleted stale file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "could not delete file"),
        }
    }
}
