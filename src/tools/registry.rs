//! Resolved tool locations and the search path they were resolved against.
//!
//! The search path is explicit state: the binary cache comes first, then the
//! ambient `PATH` captured at construction. The process environment is never
//! modified.

use super::ToolProbe;
use crate::error::ProvisionError;
use crate::models::ToolDependency;
use crate::system::{self, Invocation};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolRegistry {
    search_path: Vec<PathBuf>,
    resolved: BTreeMap<String, PathBuf>,
}

impl ToolRegistry {
    /// `bin_dir` followed by every entry of the ambient `PATH`
    pub fn new(bin_dir: &Path) -> Self {
        let mut search_path = vec![bin_dir.to_path_buf()];
        if let Some(path) = std::env::var_os("PATH") {
            search_path.extend(std::env::split_paths(&path).filter(|p| !p.as_os_str().is_empty()));
        }
        Self::with_search_path(search_path)
    }

    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        ToolRegistry {
            search_path,
            resolved: BTreeMap::new(),
        }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn record(&mut self, name: &str, location: PathBuf) {
        log::debug!("[Registry] {} -> {}", name, location.display());
        self.resolved.insert(name.to_string(), location);
    }

    /// Location recorded by the dependency installer
    pub fn resolve(&self, name: &str) -> Result<&Path, ProvisionError> {
        self.resolved
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| ProvisionError::ToolUnresolved(name.to_string()))
    }

    pub fn resolved(&self) -> &BTreeMap<String, PathBuf> {
        &self.resolved
    }
}

/// Production probe: locate with `which`, then run the tool's presence arguments.
#[derive(Debug, Clone, Default)]
pub struct WhichProbe;

impl WhichProbe {
    pub fn new() -> Self {
        WhichProbe
    }

    /// First executable named `name` on `search_path`
    pub fn locate(name: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
        let paths = std::env::join_paths(search_path).ok()?;
        let cwd = std::env::current_dir().ok()?;
        which::which_in(name, Some(paths), cwd).ok()
    }
}

#[async_trait]
impl ToolProbe for WhichProbe {
    async fn probe(&self, tool: &ToolDependency, search_path: &[PathBuf]) -> Option<PathBuf> {
        let location = Self::locate(&tool.name, search_path)?;
        let check = Invocation::new(&location).args(tool.presence_args.iter().cloned());

        match system::run(&check).await {
            Ok(_) => Some(location),
            Err(e) => {
                log::debug!(
                    "[Registry] {} found at {} but presence check failed: {}",
                    tool.name,
                    location.display(),
                    e
                );
                None
            }
        }
    }
}
