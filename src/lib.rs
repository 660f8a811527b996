//! Devbox Bootstrap
//!
//! Provisions a local director VM next to an already-running development VM
//! and leaves behind a sourceable environment profile for the director CLI.
//! Every step detects prior work, so the whole pipeline can be rerun safely.
//!
//! The crate is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Core data structures and types
//! - **config**: Defaults, TOML loading and validation
//! - **log_collector**: File and terminal logging backend
//! - **system**: External command execution, workspace layout, status report
//! - **tools**: Capability traits and their production adapters
//! - **state_store**: Variable store access
//! - **profile**: Environment profile rendering and parsing
//! - **orchestrator**: Step pipeline, run state and the ten provisioning steps

// Core foundational modules
pub mod error;
pub mod models;

pub mod config;
pub mod log_collector;
pub mod system;

pub mod tools;

pub mod profile;
pub mod state_store;

pub mod orchestrator;

// Re-export the log crate for macro usage
pub use log;

pub use log_collector::{LogCollector, LogLine};

pub use error::{
    CommandError, ConfigError, FetchError, ProvisionError, Result, StateStoreError,
};

pub use models::{
    InstallSource, ManifestOverlaySet, NetworkConfig, StepOutcome, ToolDependency,
    WorkspacePaths,
};

pub use config::BootstrapConfig;

pub use orchestrator::{Pipeline, ProvisionContext, RunState, Step, StepStatus, Toolbox};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
