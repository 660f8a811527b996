//! Platform guard: a development VM must be running before anything is deployed next to it.

use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use async_trait::async_trait;

pub struct PlatformGuard;

#[async_trait]
impl Step for PlatformGuard {
    fn name(&self) -> &'static str {
        "platform"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let dev_vm = &ctx.config.dev_vm;
        let unavailable = || ProvisionError::PlatformUnavailable {
            vm: dev_vm.name_prefix.clone(),
            hint: dev_vm.start_hint.clone(),
        };

        let running = ctx.tools.hypervisor.running_vms().await.map_err(|e| {
            log::debug!("[Platform] Listing running VMs failed: {}", e);
            unavailable()
        })?;

        match running.iter().find(|vm| vm.starts_with(&dev_vm.name_prefix)) {
            Some(vm) => {
                log::info!("[Platform] Development VM '{}' is running", vm);
                Ok(StepOutcome::Completed)
            }
            None => {
                log::debug!("[Platform] Running VMs: {:?}", running);
                Err(unavailable())
            }
        }
    }
}
