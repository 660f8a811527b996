//! NAT network and DHCP server creation.
//!
//! "Already exists" is success. Any other failure aborts the run unless
//! `network.permissive_errors` is set, in which case it is logged and ignored.

use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use crate::tools::ToolOutcome;
use async_trait::async_trait;

pub struct NetworkConfigurator;

/// Fold one outcome into the step result; `Ok(true)` means something changed.
fn accept(what: &str, outcome: ToolOutcome, permissive: bool) -> Result<bool, ProvisionError> {
    match outcome {
        ToolOutcome::Done => {
            log::info!("[Network] Created {}", what);
            Ok(true)
        }
        ToolOutcome::AlreadySatisfied => {
            log::info!("[Network] {} already exists", what);
            Ok(false)
        }
        ToolOutcome::Failed(reason) if permissive => {
            log::warn!("[Network] Ignoring failure creating {}: {}", what, reason);
            Ok(false)
        }
        ToolOutcome::Failed(reason) => Err(ProvisionError::Network(format!(
            "creating {} failed: {}",
            what, reason
        ))),
    }
}

#[async_trait]
impl Step for NetworkConfigurator {
    fn name(&self) -> &'static str {
        "network"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let network = &ctx.config.network;
        let permissive = network.permissive_errors;

        let nat = ctx.tools.hypervisor.create_nat_network(network).await;
        let mut changed = accept(
            &format!("NAT network '{}' ({})", network.name, network.cidr),
            nat,
            permissive,
        )?;

        if network.dhcp_enabled {
            let dhcp = ctx.tools.hypervisor.add_dhcp_server(network).await;
            changed |= accept(
                &format!("DHCP server {} on '{}'", network.dhcp.server_ip, network.name),
                dhcp,
                permissive,
            )?;
        }

        if changed {
            Ok(StepOutcome::Completed)
        } else {
            Ok(StepOutcome::AlreadySatisfied(format!(
                "network '{}' in place",
                network.name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_strict_failure_is_fatal() {
        let result = accept("NAT network", ToolOutcome::Failed("boom".into()), false);
        assert!(matches!(result, Err(ProvisionError::Network(_))));
    }

    #[test]
    fn test_accept_permissive_failure_continues() {
        let result = accept("NAT network", ToolOutcome::Failed("boom".into()), true);
        assert_eq!(result.unwrap(), false);
    }

    #[test]
    fn test_accept_outcomes() {
        assert!(accept("x", ToolOutcome::Done, false).unwrap());
        assert!(!accept("x", ToolOutcome::AlreadySatisfied, false).unwrap());
    }
}
