//! Deployment repository checkout. An existing checkout is never touched.

use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use async_trait::async_trait;

pub struct RepositoryFetcher;

#[async_trait]
impl Step for RepositoryFetcher {
    fn name(&self) -> &'static str {
        "repository"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let target = ctx.checkout_dir();
        if target.exists() {
            return Ok(StepOutcome::AlreadySatisfied(format!(
                "checkout exists at {}",
                target.display()
            )));
        }

        let repo = &ctx.config.repository;
        let head = ctx
            .tools
            .cloner
            .clone_repo(&repo.url, repo.reference.as_deref(), &target)
            .await
            .map_err(|e| ProvisionError::Clone(e.to_string()))?;

        log::info!(
            "[Repository] Cloned {} into {} at {}",
            repo.url,
            target.display(),
            head
        );
        Ok(StepOutcome::Completed)
    }
}
