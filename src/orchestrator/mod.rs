//! Provisioning Orchestration: an ordered, idempotent step pipeline.
//!
//! Steps run strictly one after another. Each detects pre-existing state and
//! either completes, completes as a no-op, or aborts the whole run. State
//! discovered by one step (resolved tool paths, host interface, profile path)
//! reaches later steps through `ProvisionContext`.

pub mod phases;
pub mod state;

pub use state::{RunState, StepRecord, StepStatus};

use crate::config::BootstrapConfig;
use crate::error::ProvisionError;
use crate::models::{StepOutcome, WorkspacePaths};
use crate::state_store::{FileStateStore, StateStore};
use crate::tools::host::SystemHost;
use crate::tools::{
    ArtifactFetcher, BoshCli, DirectorCli, GitCloner, HostNetwork, HttpFetcher, Hypervisor,
    RepositoryCloner, ToolProbe, ToolRegistry, VBoxManage, WhichProbe,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Every external collaborator the steps talk to.
#[derive(Clone)]
pub struct Toolbox {
    pub hypervisor: Arc<dyn Hypervisor>,
    pub director: Arc<dyn DirectorCli>,
    pub host: Arc<dyn HostNetwork>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
    pub probe: Arc<dyn ToolProbe>,
    pub cloner: Arc<dyn RepositoryCloner>,
    pub state: Arc<dyn StateStore>,
}

impl Toolbox {
    /// Adapters that drive the real host.
    pub fn production(config: &BootstrapConfig) -> Self {
        Toolbox {
            hypervisor: Arc::new(VBoxManage::new(&config.host.hypervisor_command)),
            director: Arc::new(BoshCli::new()),
            host: Arc::new(SystemHost::native(config.host.privilege_command.clone())),
            fetcher: Arc::new(HttpFetcher::new()),
            probe: Arc::new(WhichProbe::new()),
            cloner: Arc::new(GitCloner::new()),
            state: Arc::new(FileStateStore::new()),
        }
    }
}

/// State threaded through the pipeline; one step borrows it at a time.
pub struct ProvisionContext {
    pub config: BootstrapConfig,
    pub paths: WorkspacePaths,
    pub tools: Toolbox,
    /// Search path plus tool locations recorded by the installer
    pub registry: ToolRegistry,
    /// Host interface carrying the dev VM gateway, once discovered
    pub interface: Option<String>,
    /// Written by the credential extractor
    pub profile_path: Option<PathBuf>,
}

impl ProvisionContext {
    pub fn new(config: BootstrapConfig, tools: Toolbox) -> Self {
        let paths = config.workspace_paths();
        let registry = ToolRegistry::new(&paths.bin_dir);
        Self::with_registry(config, paths, tools, registry)
    }

    /// Context with an explicit search path instead of the ambient `PATH`.
    pub fn with_registry(
        config: BootstrapConfig,
        paths: WorkspacePaths,
        tools: Toolbox,
        registry: ToolRegistry,
    ) -> Self {
        ProvisionContext {
            config,
            paths,
            tools,
            registry,
            interface: None,
            profile_path: None,
        }
    }

    pub fn checkout_dir(&self) -> PathBuf {
        self.config.checkout_dir(&self.paths)
    }

    pub fn vars_store_path(&self) -> PathBuf {
        self.config.vars_store_path(&self.checkout_dir())
    }

    /// Profile location, whether or not this run has written it yet
    pub fn profile_path(&self) -> PathBuf {
        self.profile_path
            .clone()
            .unwrap_or_else(|| self.config.profile_path(&self.checkout_dir()))
    }
}

/// One environment-mutating unit of the pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError>;
}

/// Ordered step list plus the cancellation signal checked between steps.
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
    cancel_rx: watch::Receiver<bool>,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn Step>>, cancel_rx: watch::Receiver<bool>) -> Self {
        Pipeline { steps, cancel_rx }
    }

    /// All ten provisioning steps in execution order.
    pub fn standard(cancel_rx: watch::Receiver<bool>) -> Self {
        Self::new(phases::standard_steps(), cancel_rx)
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Run every step in order, stopping at the first fatal error.
    ///
    /// # Returns
    /// The per-step record of a fully successful run, otherwise the first
    /// fatal error.
    pub async fn run(&self, ctx: &mut ProvisionContext) -> Result<RunState, ProvisionError> {
        let mut run = RunState::new(self.step_names());
        let total = self.steps.len();

        for (index, step) in self.steps.iter().enumerate() {
            if self.cancelled() {
                log::warn!("[Pipeline] Cancellation requested before '{}'", step.name());
                run.cancel_remaining();
                return Err(ProvisionError::Cancelled(step.name().to_string()));
            }

            crate::log_parsed!("[Pipeline] [{}/{}] {}", index + 1, total, step.name());
            run.transition_to(index, StepStatus::Running)
                .map_err(ProvisionError::Pipeline)?;

            match step.run(ctx).await {
                Ok(outcome) => {
                    log::info!("[Pipeline] {}: {}", step.name(), outcome);
                    run.record_outcome(index, &outcome)
                        .map_err(ProvisionError::Pipeline)?;
                }
                Err(e) => {
                    log::error!("[Pipeline] {} failed: {}", step.name(), e);
                    let _ = run.record_error(index, e.to_string());
                    run.cancel_remaining();
                    return Err(e);
                }
            }
        }

        log::info!(
            "[Pipeline] Finished in {:.1}s: {} completed, {} already satisfied",
            run.elapsed_since_start().as_secs_f64(),
            run.count(StepStatus::Completed),
            run.count(StepStatus::Skipped)
        );
        Ok(run)
    }
}
