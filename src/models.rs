//! Core data types for Devbox Bootstrap.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a tool artifact comes from and how to unpack it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InstallSource {
    /// The URL serves the executable itself
    Binary { url: String },
    /// The URL serves a gzip tarball; `member` is the entry to extract
    Archive { url: String, member: String },
}

impl InstallSource {
    pub fn url(&self) -> &str {
        match self {
            InstallSource::Binary { url } => url,
            InstallSource::Archive { url, .. } => url,
        }
    }
}

/// An auxiliary CLI tool the pipeline needs on its search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDependency {
    /// Executable name, also the file name inside the binary cache
    pub name: String,

    /// Arguments for the side-effect-free presence check (e.g. `--version`)
    #[serde(default = "default_presence_args")]
    pub presence_args: Vec<String>,

    /// Unix permission bits applied after install
    #[serde(default = "default_tool_mode")]
    pub mode: u32,

    pub source: InstallSource,
}

fn default_presence_args() -> Vec<String> {
    vec!["--version".to_string()]
}

fn default_tool_mode() -> u32 {
    0o755
}

impl ToolDependency {
    pub fn binary(name: &str, url: String) -> Self {
        ToolDependency {
            name: name.to_string(),
            presence_args: default_presence_args(),
            source: InstallSource::Binary { url },
            mode: default_tool_mode(),
        }
    }

    pub fn archive(name: &str, url: String, member: &str) -> Self {
        ToolDependency {
            name: name.to_string(),
            presence_args: default_presence_args(),
            source: InstallSource::Archive {
                url,
                member: member.to_string(),
            },
            mode: default_tool_mode(),
        }
    }

    /// Install location inside the binary cache
    pub fn install_path(&self, bin_dir: &Path) -> PathBuf {
        bin_dir.join(&self.name)
    }
}

/// Local working directories owned by the pipeline for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    /// Binary cache: installed tools land here
    pub bin_dir: PathBuf,
    /// Library cache: repository checkouts land here
    pub lib_dir: PathBuf,
}

/// DHCP server settings attached to the NAT network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpConfig {
    pub server_ip: String,
    pub lower_ip: String,
    pub upper_ip: String,
    pub netmask: String,
}

impl Default for DhcpConfig {
    fn default() -> Self {
        DhcpConfig {
            server_ip: "10.0.2.3".to_string(),
            lower_ip: "10.0.2.4".to_string(),
            upper_ip: "10.0.2.254".to_string(),
            netmask: "255.255.255.0".to_string(),
        }
    }
}

/// Isolated NAT network for the director VM's outbound traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub name: String,
    pub cidr: String,
    pub dhcp_enabled: bool,
    /// Treat any creation failure as success instead of only "already exists"
    pub permissive_errors: bool,
    pub dhcp: DhcpConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            name: "NatNetwork".to_string(),
            cidr: "10.0.2.0/24".to_string(),
            dhcp_enabled: true,
            permissive_errors: false,
            dhcp: DhcpConfig::default(),
        }
    }
}

/// Base manifest plus ordered overlays and template variables.
///
/// Overlay order is significant: later overlays patch earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestOverlaySet {
    pub base_manifest: PathBuf,
    pub overlays: Vec<PathBuf>,
    pub variables: BTreeMap<String, String>,
}

impl ManifestOverlaySet {
    pub fn new(base_manifest: impl Into<PathBuf>) -> Self {
        ManifestOverlaySet {
            base_manifest: base_manifest.into(),
            overlays: Vec::new(),
            variables: BTreeMap::new(),
        }
    }

    pub fn overlay(mut self, path: impl Into<PathBuf>) -> Self {
        self.overlays.push(path.into());
        self
    }

    pub fn variable(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    /// Re-root every relative manifest path under `dir`.
    pub fn rooted_at(&self, dir: &Path) -> Self {
        ManifestOverlaySet {
            base_manifest: dir.join(&self.base_manifest),
            overlays: self.overlays.iter().map(|o| dir.join(o)).collect(),
            variables: self.variables.clone(),
        }
    }

    /// `-o <overlay>` pairs in declaration order, then `-v name=value` pairs.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.overlays.len() * 2 + self.variables.len() * 2);
        for overlay in &self.overlays {
            args.push("-o".to_string());
            args.push(overlay.to_string_lossy().to_string());
        }
        for (name, value) in &self.variables {
            args.push("-v".to_string());
            args.push(format!("{}={}", name, value));
        }
        args
    }
}

/// Outcome of a single pipeline step that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step changed something
    Completed,
    /// Nothing to do; the reason says which marker short-circuited it
    AlreadySatisfied(String),
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Completed => write!(f, "completed"),
            StepOutcome::AlreadySatisfied(reason) => write!(f, "already satisfied ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_order_preserved_in_args() {
        let set = ManifestOverlaySet::new("bosh.yml")
            .overlay("virtualbox/cpi.yml")
            .overlay("bosh-lite.yml")
            .overlay("jumpbox-user.yml")
            .variable("internal_ip", "192.168.11.6");

        let args = set.to_args();
        assert_eq!(
            args,
            vec![
                "-o",
                "virtualbox/cpi.yml",
                "-o",
                "bosh-lite.yml",
                "-o",
                "jumpbox-user.yml",
                "-v",
                "internal_ip=192.168.11.6",
            ]
        );
    }

    #[test]
    fn test_rooted_at_keeps_order_and_variables() {
        let set = ManifestOverlaySet::new("bosh.yml")
            .overlay("b.yml")
            .overlay("a.yml")
            .variable("director_name", "vbox");
        let rooted = set.rooted_at(Path::new("/lib/bosh-deployment"));

        assert_eq!(rooted.base_manifest, PathBuf::from("/lib/bosh-deployment/bosh.yml"));
        assert_eq!(
            rooted.overlays,
            vec![
                PathBuf::from("/lib/bosh-deployment/b.yml"),
                PathBuf::from("/lib/bosh-deployment/a.yml"),
            ]
        );
        assert_eq!(rooted.variables.get("director_name").map(String::as_str), Some("vbox"));
    }

    #[test]
    fn test_tool_dependency_deserialize_defaults() {
        let tool: ToolDependency = toml::from_str(
            r#"
            name = "bosh"
            [source]
            kind = "binary"
            url = "https://example.invalid/bosh"
            "#,
        )
        .unwrap();
        assert_eq!(tool.presence_args, vec!["--version"]);
        assert_eq!(tool.mode, 0o755);
        assert_eq!(tool.source.url(), "https://example.invalid/bosh");
        assert_eq!(tool.install_path(Path::new("/w/bin")), PathBuf::from("/w/bin/bosh"));
    }

    #[test]
    fn test_step_outcome_display() {
        assert_eq!(StepOutcome::Completed.to_string(), "completed");
        assert_eq!(
            StepOutcome::AlreadySatisfied("checkout exists".into()).to_string(),
            "already satisfied (checkout exists)"
        );
    }
}
