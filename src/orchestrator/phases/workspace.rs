//! Workspace initialization: binary cache and library cache under the working root.

use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use async_trait::async_trait;

pub struct WorkspaceInitializer;

#[async_trait]
impl Step for WorkspaceInitializer {
    fn name(&self) -> &'static str {
        "workspace"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let created = ctx.paths.ensure()?;

        if created.is_empty() {
            return Ok(StepOutcome::AlreadySatisfied(format!(
                "workspace present at {}",
                ctx.paths.root.display()
            )));
        }

        for dir in &created {
            log::info!("[Workspace] Created {}", dir.display());
        }
        Ok(StepOutcome::Completed)
    }
}
