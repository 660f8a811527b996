//! Dependency installation into the binary cache.
//!
//! The presence probe always runs before any download. Failures are fatal and
//! partially written artifacts are left in place for inspection.

use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use crate::tools::fetch::install_artifact;
use async_trait::async_trait;

pub struct DependencyInstaller;

#[async_trait]
impl Step for DependencyInstaller {
    fn name(&self) -> &'static str {
        "installer"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let tools = ctx.config.tools.clone();
        let mut installed = 0usize;

        for tool in &tools {
            let found = ctx
                .tools
                .probe
                .probe(tool, ctx.registry.search_path())
                .await;

            if let Some(location) = found {
                log::info!("[Installer] {} already present at {}", tool.name, location.display());
                ctx.registry.record(&tool.name, location);
                continue;
            }

            log::info!("[Installer] Installing {} from {}", tool.name, tool.source.url());
            let install_err = |reason: String| ProvisionError::ToolInstall {
                tool: tool.name.clone(),
                reason,
            };

            let artifact = ctx
                .tools
                .fetcher
                .fetch(tool.source.url())
                .await
                .map_err(|e| install_err(e.to_string()))?;

            let location = install_artifact(tool, &artifact, &ctx.paths.bin_dir)
                .map_err(|e| install_err(e.to_string()))?;

            log::info!("[Installer] ✓ {} installed at {}", tool.name, location.display());
            ctx.registry.record(&tool.name, location);
            installed += 1;
        }

        if installed == 0 {
            Ok(StepOutcome::AlreadySatisfied(format!(
                "all {} tools present",
                tools.len()
            )))
        } else {
            Ok(StepOutcome::Completed)
        }
    }
}
