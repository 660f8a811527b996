//! Host route to the director subnet: delete any existing entry, then add one.

use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use crate::tools::ToolOutcome;
use async_trait::async_trait;

pub struct RouteConfigurator;

#[async_trait]
impl Step for RouteConfigurator {
    fn name(&self) -> &'static str {
        "routes"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let route = &ctx.config.route;

        match ctx.tools.host.delete_route(&route.subnet).await {
            ToolOutcome::Done => log::info!("[Routes] Removed existing route to {}", route.subnet),
            ToolOutcome::AlreadySatisfied => {
                log::debug!("[Routes] No existing route to {}", route.subnet)
            }
            ToolOutcome::Failed(reason) => {
                log::warn!("[Routes] Deleting route to {} failed: {}", route.subnet, reason)
            }
        }

        match ctx.tools.host.add_route(&route.subnet, &route.gateway).await {
            ToolOutcome::Done | ToolOutcome::AlreadySatisfied => {
                log::info!("[Routes] {} via {}", route.subnet, route.gateway);
                Ok(StepOutcome::Completed)
            }
            ToolOutcome::Failed(reason) => Err(ProvisionError::Route(format!(
                "{} via {}: {}",
                route.subnet, route.gateway, reason
            ))),
        }
    }
}
