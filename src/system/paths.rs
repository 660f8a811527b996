/// Workspace layout: idempotent creation of the working root's cache directories.
///
/// The working root owns two caches for the lifetime of the pipeline:
/// `bin/` for installed tools and `lib/` for repository checkouts.
use crate::models::WorkspacePaths;
use std::io;
use std::path::{Path, PathBuf};

impl WorkspacePaths {
    /// Create root, binary cache and library cache if missing.
    ///
    /// # Returns
    /// The directories that did not exist before this call, in creation order.
    /// An empty list means the workspace was already in place.
    pub fn ensure(&self) -> io::Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for dir in [&self.root, &self.bin_dir, &self.lib_dir] {
            if !dir.is_dir() {
                std::fs::create_dir_all(dir)?;
                created.push(dir.clone());
            }
        }
        Ok(created)
    }

    /// Whether every cache directory exists.
    pub fn is_initialized(&self) -> bool {
        self.root.is_dir() && self.bin_dir.is_dir() && self.lib_dir.is_dir()
    }

    /// Resolve a relative path against the working root
    pub fn resolve_relative(&self, relative_path: &Path) -> PathBuf {
        self.root.join(relative_path)
    }
}
