//! Orchestrator phases: one module per provisioning step.
//!
//! - **prerequisites**: hypervisor control tool is installed
//! - **workspace**: binary and library caches exist
//! - **platform**: development VM is running
//! - **installer**: auxiliary CLI tools are resolvable
//! - **repository**: manifest repository is checked out
//! - **network**: NAT network and DHCP server exist
//! - **director**: director VM is deployed
//! - **credentials**: environment profile reflects the variable store
//! - **routes**: exactly one host route to the director subnet
//! - **cloud_config**: baseline cloud config is uploaded

pub mod cloud_config;
pub mod credentials;
pub mod director;
pub mod installer;
pub mod network;
pub mod platform;
pub mod prerequisites;
pub mod repository;
pub mod routes;
pub mod workspace;

pub use cloud_config::CloudConfigPublisher;
pub use credentials::CredentialExtractor;
pub use director::DirectorDeployer;
pub use installer::DependencyInstaller;
pub use network::NetworkConfigurator;
pub use platform::PlatformGuard;
pub use prerequisites::PrerequisiteChecker;
pub use repository::RepositoryFetcher;
pub use routes::RouteConfigurator;
pub use workspace::WorkspaceInitializer;

use super::Step;

/// Name of the director CLI in the tool registry
pub const DIRECTOR_TOOL: &str = "bosh";

/// All steps in execution order.
pub fn standard_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(PrerequisiteChecker),
        Box::new(WorkspaceInitializer),
        Box::new(PlatformGuard),
        Box::new(DependencyInstaller),
        Box::new(RepositoryFetcher),
        Box::new(NetworkConfigurator),
        Box::new(DirectorDeployer),
        Box::new(CredentialExtractor),
        Box::new(RouteConfigurator),
        Box::new(CloudConfigPublisher),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_step_order() {
        let names: Vec<&str> = standard_steps().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "prerequisites",
                "workspace",
                "platform",
                "installer",
                "repository",
                "network",
                "director",
                "credentials",
                "routes",
                "cloud_config",
            ]
        );
    }
}
