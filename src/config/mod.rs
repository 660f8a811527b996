//! Configuration module for the provisioning pipeline.
//!
//! All values the pipeline needs are fixed defaults that an optional TOML file
//! can override section by section.
//!
//! # Module Structure
//!
//! - `loader`: Locates, reads and writes the TOML config file
//! - `validator`: Checks addresses, CIDRs, DHCP range and tool list
//!
//! # Configuration Flow
//!
//! 1. `loader::load_or_default` reads `--config` or the per-user config file
//! 2. Missing sections fall back to `Default`
//! 3. `validator::validate_config` rejects inconsistent values before any step runs
//! 4. The pipeline context owns the validated `BootstrapConfig`

pub mod loader;
pub mod validator;

use crate::models::{ManifestOverlaySet, NetworkConfig, ToolDependency, WorkspacePaths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Working root layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Working root; relative roots resolve against the current directory
    pub root: PathBuf,
    pub bin_dir: String,
    pub lib_dir: String,
    pub log_dir: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            root: PathBuf::from("."),
            bin_dir: "bin".to_string(),
            lib_dir: "lib".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

/// The single-box development VM the director attaches to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevVmConfig {
    /// Running VMs whose name starts with this prefix satisfy the platform guard
    pub name_prefix: String,
    /// Host-side address of the dev VM's private network
    pub gateway_address: String,
    pub start_hint: String,
}

impl Default for DevVmConfig {
    fn default() -> Self {
        DevVmConfig {
            name_prefix: "pcfdev".to_string(),
            gateway_address: "192.168.11.1".to_string(),
            start_hint: "cf dev start".to_string(),
        }
    }
}

/// Director deployment settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub name: String,
    /// Alias written to the profile as the environment name
    pub environment: String,
    pub client: String,
    pub internal_ip: String,
    pub internal_gw: String,
    pub internal_cidr: String,
    pub port: u16,
    pub base_manifest: PathBuf,
    /// Applied in order; later overlays override earlier ones
    pub overlays: Vec<PathBuf>,
    /// Variable store file name inside the checkout
    pub vars_store: String,
    /// Deploy state file name inside the checkout
    pub state_file: String,
    /// VM store directory name under the library cache
    pub vm_store_dir: String,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        DirectorConfig {
            name: "vbox".to_string(),
            environment: "vbox".to_string(),
            client: "admin".to_string(),
            internal_ip: "192.168.11.6".to_string(),
            internal_gw: "192.168.11.1".to_string(),
            internal_cidr: "192.168.11.0/24".to_string(),
            port: 25555,
            base_manifest: PathBuf::from("bosh.yml"),
            overlays: vec![
                PathBuf::from("virtualbox/cpi.yml"),
                PathBuf::from("virtualbox/local-store-dir.yml"),
                PathBuf::from("bosh-lite.yml"),
                PathBuf::from("virtualbox/outbound-network.yml"),
                PathBuf::from("jumpbox-user.yml"),
                PathBuf::from("bosh-lite-runc.yml"),
            ],
            vars_store: "creds.yml".to_string(),
            state_file: "state.json".to_string(),
            vm_store_dir: "vbox-store".to_string(),
        }
    }
}

impl DirectorConfig {
    /// HTTPS endpoint derived from the internal IP
    pub fn url(&self) -> String {
        format!("https://{}:{}", self.internal_ip, self.port)
    }
}

/// Host route to the director's service subnet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub subnet: String,
    pub gateway: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        RouteConfig {
            subnet: "10.144.0.0/16".to_string(),
            gateway: "192.168.11.6".to_string(),
        }
    }
}

/// Deployment manifest repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub url: String,
    /// Branch, tag or commit checked out after the clone
    pub reference: Option<String>,
    /// Checkout directory name under the library cache
    pub directory: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            url: "https://github.com/cloudfoundry/bosh-deployment.git".to_string(),
            reference: None,
            directory: "bosh-deployment".to_string(),
        }
    }
}

/// Where derived credential artifacts are written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Profile file name inside the checkout
    pub file_name: String,
    pub ca_cert_path: PathBuf,
    pub private_key_path: PathBuf,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let tmp = std::env::temp_dir();
        ProfileConfig {
            file_name: "director-env.sh".to_string(),
            ca_cert_path: tmp.join("director-ca.crt"),
            private_key_path: tmp.join("jumpbox.key"),
        }
    }
}

/// Host command settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Prefix for routing-table mutations; `None` runs them directly
    pub privilege_command: Option<String>,
    pub hypervisor_command: String,
    pub hypervisor_hint: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            privilege_command: Some("sudo".to_string()),
            hypervisor_command: "VBoxManage".to_string(),
            hypervisor_hint: "https://www.virtualbox.org/wiki/Downloads".to_string(),
        }
    }
}

/// Complete pipeline configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Cloud config document; defaults to `<root>/cloud-config.yml`
    pub cloud_config: Option<PathBuf>,
    pub workspace: WorkspaceConfig,
    pub dev_vm: DevVmConfig,
    pub network: NetworkConfig,
    pub director: DirectorConfig,
    pub route: RouteConfig,
    pub repository: RepositoryConfig,
    pub profile: ProfileConfig,
    pub host: HostConfig,
    pub tools: Vec<ToolDependency>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            cloud_config: None,
            workspace: WorkspaceConfig::default(),
            dev_vm: DevVmConfig::default(),
            network: NetworkConfig::default(),
            director: DirectorConfig::default(),
            route: RouteConfig::default(),
            repository: RepositoryConfig::default(),
            profile: ProfileConfig::default(),
            host: HostConfig::default(),
            tools: default_tools(),
        }
    }
}

impl BootstrapConfig {
    /// Resolve the working root layout.
    pub fn workspace_paths(&self) -> WorkspacePaths {
        let root = if self.workspace.root.is_absolute() {
            self.workspace.root.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.workspace.root))
                .unwrap_or_else(|_| self.workspace.root.clone())
        };
        WorkspacePaths {
            bin_dir: root.join(&self.workspace.bin_dir),
            lib_dir: root.join(&self.workspace.lib_dir),
            root,
        }
    }

    pub fn log_dir(&self, paths: &WorkspacePaths) -> PathBuf {
        paths.root.join(&self.workspace.log_dir)
    }

    pub fn checkout_dir(&self, paths: &WorkspacePaths) -> PathBuf {
        paths.lib_dir.join(&self.repository.directory)
    }

    pub fn vars_store_path(&self, checkout: &Path) -> PathBuf {
        checkout.join(&self.director.vars_store)
    }

    pub fn profile_path(&self, checkout: &Path) -> PathBuf {
        checkout.join(&self.profile.file_name)
    }

    /// Cloud config document; relative paths resolve against the working root
    pub fn cloud_config_path(&self, paths: &WorkspacePaths) -> PathBuf {
        match &self.cloud_config {
            Some(path) => paths.resolve_relative(path),
            None => paths.resolve_relative(Path::new("cloud-config.yml")),
        }
    }

    /// Manifest, overlays and the variables known before interface discovery.
    pub fn overlay_set(&self, paths: &WorkspacePaths) -> ManifestOverlaySet {
        let director = &self.director;
        let mut set = ManifestOverlaySet::new(&director.base_manifest);
        for overlay in &director.overlays {
            set = set.overlay(overlay);
        }
        set.variable("director_name", director.name.as_str())
            .variable("internal_ip", director.internal_ip.as_str())
            .variable("internal_gw", director.internal_gw.as_str())
            .variable("internal_cidr", director.internal_cidr.as_str())
            .variable("outbound_network_name", self.network.name.as_str())
            .variable(
                "vm_store_dir",
                paths
                    .lib_dir
                    .join(&director.vm_store_dir)
                    .to_string_lossy()
                    .to_string(),
            )
    }
}

/// Operating system component used in release artifact names.
pub fn platform_os() -> &'static str {
    if cfg!(target_os = "macos") {
        "darwin"
    } else {
        "linux"
    }
}

/// The fixed tool set: director CLI, platform CLI, identity CLI, credential CLI.
pub fn default_tools() -> Vec<ToolDependency> {
    let os = platform_os();
    let cf_release = if os == "darwin" { "macosx64" } else { "linux64" };

    let mut uaa = ToolDependency::binary(
        "uaa",
        format!(
            "https://github.com/cloudfoundry/uaa-cli/releases/download/0.14.0/uaa-{}-amd64-0.14.0",
            os
        ),
    );
    uaa.presence_args = vec!["version".to_string()];

    vec![
        ToolDependency::binary(
            "bosh",
            format!(
                "https://github.com/cloudfoundry/bosh-cli/releases/download/v7.5.2/bosh-cli-7.5.2-{}-amd64",
                os
            ),
        ),
        ToolDependency::archive(
            "cf",
            format!(
                "https://packages.cloudfoundry.org/stable?release={}-binary&version=8.7.4&source=github-rel",
                cf_release
            ),
            "cf8",
        ),
        uaa,
        ToolDependency::archive(
            "credhub",
            format!(
                "https://github.com/cloudfoundry/credhub-cli/releases/download/2.9.25/credhub-{}-2.9.25.tgz",
                os
            ),
            "credhub",
        ),
    ]
}
