//! Native git management using the `git2` crate.
//!
//! Clones the deployment manifest repository without shelling out to `git`.

use super::RepositoryCloner;
use async_trait::async_trait;
use git2::{build::RepoBuilder, Repository};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Clone error: {0}")]
    Clone(String),

    #[error("Checkout error: {0}")]
    Checkout(String),

    #[error("Reference not found: {0}")]
    RefNotFound(String),

    #[error("Invalid reference: {0}")]
    InvalidRef(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git2 error: {0}")]
    Git2(#[from] git2::Error),
}

/// Result type for git operations
pub type GitResult<T> = Result<T, GitError>;

/// Manages a checked-out repository using native git bindings
pub struct GitManager {
    repo_path: PathBuf,
}

impl GitManager {
    /// Creates a new GitManager for an existing repository
    pub fn new(repo_path: impl AsRef<Path>) -> GitResult<Self> {
        let repo_path = repo_path.as_ref().to_path_buf();

        // Verify the repository exists if the path exists
        if repo_path.exists() {
            Repository::open(&repo_path).map_err(|e| {
                GitError::Repository(format!(
                    "Failed to open repository at {:?}: {}",
                    repo_path, e
                ))
            })?;
        }

        Ok(GitManager { repo_path })
    }

    /// Full clone of `url` into `target_path`; any branch or tag can be checked out afterwards.
    ///
    /// # Errors
    /// Returns `GitError::Clone` if the clone operation fails
    pub fn clone(url: &str, target_path: impl AsRef<Path>) -> GitResult<Self> {
        let target_path = target_path.as_ref();
        log::info!("[Git] [CLONE] Cloning {} into {}", url, target_path.display());

        let mut callbacks = git2::RemoteCallbacks::new();
        let mut last_percent = 0u32;
        callbacks.transfer_progress(move |progress| {
            let total = progress.total_objects();
            if total > 0 {
                let percent = (progress.received_objects() as f32 / total as f32 * 100.0) as u32;
                if percent >= last_percent + 25 {
                    last_percent = percent;
                    log::debug!(
                        "[Git] [CLONE] [PROGRESS] {}/{} objects - {}%",
                        progress.received_objects(),
                        total,
                        percent
                    );
                }
            }
            true
        });

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, target_path)
            .map_err(|e| {
                GitError::Clone(format!(
                    "Failed to clone {} to {:?}: {}",
                    url, target_path, e
                ))
            })?;

        log::info!("[Git] [CLONE] ✓ Clone completed");
        GitManager::new(target_path)
    }

    fn open(&self) -> GitResult<Repository> {
        Repository::open(&self.repo_path)
            .map_err(|e| GitError::Repository(format!("Failed to open repository: {}", e)))
    }

    /// Checks out a specific commit, tag, or branch
    ///
    /// Remote branches are tried as `origin/<reference>` when the bare name
    /// does not resolve, since a fresh clone only has the default branch locally.
    ///
    /// # Errors
    /// Returns `GitError::RefNotFound` if the reference doesn't exist
    /// Returns `GitError::Checkout` if the checkout operation fails
    pub fn checkout(&self, reference: &str) -> GitResult<()> {
        let repo = self.open()?;

        let obj = repo
            .revparse_single(reference)
            .or_else(|_| repo.revparse_single(&format!("origin/{}", reference)))
            .map_err(|e| {
                GitError::RefNotFound(format!(
                    "Failed to resolve reference '{}': {}",
                    reference, e
                ))
            })?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        repo.checkout_tree(&obj, Some(&mut checkout)).map_err(|e| {
            GitError::Checkout(format!("Failed to check out {}: {}", reference, e))
        })?;

        let commit = obj.peel_to_commit().map_err(|e| {
            GitError::InvalidRef(format!("Reference '{}' is not a commit: {}", reference, e))
        })?;
        repo.set_head_detached(commit.id())
            .map_err(|e| GitError::Checkout(format!("Failed to set HEAD: {}", e)))?;

        Ok(())
    }

    /// Gets the current HEAD commit hash
    pub fn get_head_commit(&self) -> GitResult<String> {
        let repo = self.open()?;
        let head = repo
            .head()
            .map_err(|e| GitError::Repository(format!("Failed to read HEAD: {}", e)))?;

        let commit_id = head
            .target()
            .ok_or_else(|| GitError::Repository("HEAD is not a direct reference".to_string()))?;

        Ok(commit_id.to_string())
    }

    /// Returns the path to the repository
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

/// Production cloner; runs `git2` on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct GitCloner;

impl GitCloner {
    pub fn new() -> Self {
        GitCloner
    }
}

#[async_trait]
impl RepositoryCloner for GitCloner {
    async fn clone_repo(
        &self,
        url: &str,
        reference: Option<&str>,
        target: &Path,
    ) -> Result<String, GitError> {
        let url = url.to_string();
        let reference = reference.map(str::to_string);
        let target = target.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let manager = GitManager::clone(&url, &target)?;
            if let Some(reference) = reference {
                log::info!("[Git] Checking out {}", reference);
                manager.checkout(&reference)?;
            }
            let head = manager.get_head_commit()?;
            log::debug!("[Git] {} at {}", manager.repo_path().display(), head);
            Ok::<String, GitError>(head)
        })
        .await
        .map_err(|e| GitError::Clone(format!("Clone task failed: {}", e)))?
    }
}
