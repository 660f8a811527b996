/// Provisioning Status Report
///
/// Read-only inspection of the markers each step uses to detect prior work.
/// Nothing is created, downloaded or executed.

use crate::config::BootstrapConfig;
use crate::models::WorkspacePaths;
use crate::state_store::StateStore;
use crate::tools::{ToolRegistry, WhichProbe};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Overall status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Director deployed and profile written
    Provisioned,
    /// Some markers present; a run will finish the job
    Partial,
    /// Nothing provisioned yet
    Fresh,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Provisioned => "Provisioned",
            HealthStatus::Partial => "Partial",
            HealthStatus::Fresh => "Fresh",
        }
    }

    pub fn needs_run(&self) -> bool {
        !matches!(self, HealthStatus::Provisioned)
    }
}

/// Snapshot of the provisioning markers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub workspace_root: PathBuf,
    pub workspace_ready: bool,
    /// Tool name to resolved location, `None` when not found
    pub tools: Vec<(String, Option<PathBuf>)>,
    pub checkout_present: bool,
    pub director_provisioned: bool,
    pub profile_path: PathBuf,
    pub profile_present: bool,
    pub message: String,
}

impl HealthReport {
    pub fn missing_tools(&self) -> Vec<String> {
        self.tools
            .iter()
            .filter(|(_, location)| location.is_none())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Human-readable multi-line summary
    pub fn render(&self) -> String {
        let mark = |ok: bool| if ok { "✓" } else { "✗" };
        let mut out = format!("Status: {} ({})\n", self.status.as_str(), self.message);
        out.push_str(&format!(
            "  {} workspace {}\n",
            mark(self.workspace_ready),
            self.workspace_root.display()
        ));
        for (name, location) in &self.tools {
            match location {
                Some(path) => out.push_str(&format!("  ✓ {} at {}\n", name, path.display())),
                None => out.push_str(&format!("  ✗ {} not found\n", name)),
            }
        }
        out.push_str(&format!("  {} deployment checkout\n", mark(self.checkout_present)));
        out.push_str(&format!("  {} director deployed\n", mark(self.director_provisioned)));
        out.push_str(&format!(
            "  {} profile {}\n",
            mark(self.profile_present),
            self.profile_path.display()
        ));
        out
    }
}

/// Provisioning Status Manager
pub struct HealthManager;

impl HealthManager {
    /// Inspect the markers for `config` using `state` for the director check.
    pub fn check(
        config: &BootstrapConfig,
        paths: &WorkspacePaths,
        state: &dyn StateStore,
    ) -> HealthReport {
        let registry = ToolRegistry::new(&paths.bin_dir);
        let tools: Vec<(String, Option<PathBuf>)> = config
            .tools
            .iter()
            .map(|tool| {
                (
                    tool.name.clone(),
                    WhichProbe::locate(&tool.name, registry.search_path()),
                )
            })
            .collect();

        let checkout = config.checkout_dir(paths);
        let profile_path = config.profile_path(&checkout);
        let director_provisioned = state.is_provisioned(&config.vars_store_path(&checkout));

        let mut report = HealthReport {
            status: HealthStatus::Fresh,
            workspace_root: paths.root.clone(),
            workspace_ready: paths.is_initialized(),
            tools,
            checkout_present: checkout.is_dir(),
            director_provisioned,
            profile_present: profile_path.is_file(),
            profile_path,
            message: String::new(),
        };

        let missing = report.missing_tools();
        if report.director_provisioned && report.profile_present && missing.is_empty() {
            report.status = HealthStatus::Provisioned;
            report.message = "director deployed, profile ready".to_string();
        } else if report.workspace_ready || report.checkout_present || report.director_provisioned {
            report.status = HealthStatus::Partial;
            report.message = if !missing.is_empty() {
                format!("tools missing: {}", missing.join(", "))
            } else if !report.director_provisioned {
                "director not deployed".to_string()
            } else {
                "profile not written".to_string()
            };
        } else {
            report.message = "nothing provisioned".to_string();
        }

        report
    }
}
