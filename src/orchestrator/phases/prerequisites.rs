//! Prerequisite check: the hypervisor control tool must answer a version query.

use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use async_trait::async_trait;

pub struct PrerequisiteChecker;

#[async_trait]
impl Step for PrerequisiteChecker {
    fn name(&self) -> &'static str {
        "prerequisites"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let host = &ctx.config.host;

        match ctx.tools.hypervisor.version().await {
            Ok(version) => {
                log::info!("[Prerequisites] {} {}", host.hypervisor_command, version);
                Ok(StepOutcome::Completed)
            }
            Err(e) => {
                log::debug!("[Prerequisites] Version query failed: {}", e);
                Err(ProvisionError::MissingPrerequisite {
                    tool: host.hypervisor_command.clone(),
                    hint: host.hypervisor_hint.clone(),
                })
            }
        }
    }
}
