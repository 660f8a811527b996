//! Capability traits for every external collaborator the pipeline drives.
//!
//! Each trait has one production adapter that shells out or talks to the
//! network. The pipeline only sees the traits, so tests swap in recording
//! fakes without touching the host.
//!
//! # Module Structure
//!
//! - `hypervisor`: `VBoxManage` adapter (version, running VMs, NAT network, DHCP)
//! - `director`: director CLI adapter (`create-env`, `update-cloud-config`)
//! - `host`: interface discovery and routing table edits
//! - `fetch`: HTTP artifact download and tarball member extraction
//! - `registry`: resolved tool locations and the presence probe
//! - `git`: repository clone and checkout through `git2`

pub mod director;
pub mod fetch;
pub mod git;
pub mod host;
pub mod hypervisor;
pub mod registry;

pub use director::{BoshCli, DeployRequest};
pub use fetch::HttpFetcher;
pub use git::{GitCloner, GitError, GitManager};
pub use host::SystemHost;
pub use hypervisor::VBoxManage;
pub use registry::{ToolRegistry, WhichProbe};

use crate::error::{CommandError, FetchError};
use crate::models::{NetworkConfig, ToolDependency};
use crate::system::CommandOutput;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result of a mutating call against an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Done,
    /// The tool reported the desired state was already in place
    AlreadySatisfied,
    Failed(String),
}

/// Map a command result to an outcome.
///
/// A non-zero exit whose output contains any of `satisfied_markers`
/// (case-insensitive) is `AlreadySatisfied`. Spawn failures never are.
pub fn classify(
    result: Result<CommandOutput, CommandError>,
    satisfied_markers: &[&str],
) -> ToolOutcome {
    match result {
        Ok(_) => ToolOutcome::Done,
        Err(e @ CommandError::Spawn { .. }) => ToolOutcome::Failed(e.to_string()),
        Err(e) => {
            let text = e.stderr().to_lowercase();
            if satisfied_markers
                .iter()
                .any(|m| text.contains(&m.to_lowercase()))
            {
                ToolOutcome::AlreadySatisfied
            } else {
                ToolOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Virtualization host control.
#[async_trait]
pub trait Hypervisor: Send + Sync {
    /// Version string; failure means the hypervisor is not installed
    async fn version(&self) -> Result<String, CommandError>;

    /// Names of currently running VMs
    async fn running_vms(&self) -> Result<Vec<String>, CommandError>;

    async fn create_nat_network(&self, network: &NetworkConfig) -> ToolOutcome;

    async fn add_dhcp_server(&self, network: &NetworkConfig) -> ToolOutcome;
}

/// Director CLI operations. The binary comes from the tool registry.
#[async_trait]
pub trait DirectorCli: Send + Sync {
    async fn create_env(&self, binary: &Path, request: &DeployRequest) -> Result<(), CommandError>;

    /// Non-interactive cloud config upload with `env` layered over the process environment
    async fn update_cloud_config(
        &self,
        binary: &Path,
        env: &[(String, String)],
        document: &Path,
    ) -> Result<(), CommandError>;
}

/// Host interface discovery and routing table.
#[async_trait]
pub trait HostNetwork: Send + Sync {
    /// Name of the interface carrying `address`, if any
    async fn interface_with_address(&self, address: &str) -> Result<Option<String>, CommandError>;

    /// Remove any route for `subnet`. Absence is `AlreadySatisfied`.
    async fn delete_route(&self, subnet: &str) -> ToolOutcome;

    async fn add_route(&self, subnet: &str, gateway: &str) -> ToolOutcome;
}

/// Downloads release artifacts.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Side-effect-free tool presence check.
#[async_trait]
pub trait ToolProbe: Send + Sync {
    /// Location of a working `tool` on `search_path`, or `None`
    async fn probe(&self, tool: &ToolDependency, search_path: &[PathBuf]) -> Option<PathBuf>;
}

/// Source repository checkout.
#[async_trait]
pub trait RepositoryCloner: Send + Sync {
    /// Full clone of `url` into `target`, then check out `reference` if given.
    /// Returns the checked-out commit.
    async fn clone_repo(
        &self,
        url: &str,
        reference: Option<&str>,
        target: &Path,
    ) -> Result<String, GitError>;
}
