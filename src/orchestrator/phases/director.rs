//! Director deployment.
//!
//! The variable store is the provisioned marker: when it exists nothing is
//! redeployed. The host interface carrying the dev VM gateway becomes the
//! `network_name` template variable.

use super::DIRECTOR_TOOL;
use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use crate::tools::DeployRequest;
use async_trait::async_trait;

pub struct DirectorDeployer;

impl DirectorDeployer {
    async fn discover_interface(ctx: &ProvisionContext) -> Result<String, ProvisionError> {
        let gateway = &ctx.config.dev_vm.gateway_address;
        match ctx.tools.host.interface_with_address(gateway).await {
            Ok(Some(interface)) => Ok(interface),
            Ok(None) => Err(ProvisionError::InterfaceNotFound(gateway.clone())),
            Err(e) => {
                log::debug!("[Director] Interface lookup failed: {}", e);
                Err(ProvisionError::InterfaceNotFound(gateway.clone()))
            }
        }
    }
}

#[async_trait]
impl Step for DirectorDeployer {
    fn name(&self) -> &'static str {
        "director"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let vars_store = ctx.vars_store_path();
        if ctx.tools.state.is_provisioned(&vars_store) {
            return Ok(StepOutcome::AlreadySatisfied(format!(
                "variable store present at {}",
                vars_store.display()
            )));
        }

        let interface = Self::discover_interface(ctx).await?;
        log::info!(
            "[Director] Dev VM gateway {} is on interface {}",
            ctx.config.dev_vm.gateway_address,
            interface
        );
        ctx.interface = Some(interface.clone());

        let checkout = ctx.checkout_dir();
        let request = DeployRequest {
            manifests: ctx
                .config
                .overlay_set(&ctx.paths)
                .variable("network_name", interface)
                .rooted_at(&checkout),
            state_file: checkout.join(&ctx.config.director.state_file),
            vars_store: vars_store.clone(),
        };

        let binary = ctx.registry.resolve(DIRECTOR_TOOL)?.to_path_buf();
        log::info!("[Director] Deploying '{}' (this takes a while)", ctx.config.director.name);
        crate::log_parsed!("[Director] {} {}", binary.display(), request.to_args().join(" "));

        ctx.tools
            .director
            .create_env(&binary, &request)
            .await
            .map_err(|e| ProvisionError::Deploy(e.to_string()))?;

        if !ctx.tools.state.is_provisioned(&vars_store) {
            return Err(ProvisionError::Deploy(format!(
                "deploy finished but no variable store at {}",
                vars_store.display()
            )));
        }

        log::info!("[Director] ✓ Director reachable at {}", ctx.config.director.url());
        Ok(StepOutcome::Completed)
    }
}
