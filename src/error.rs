//! Unified error type hierarchy for Devbox Bootstrap
//!
//! Provides structured error handling with ConfigError, CommandError, FetchError,
//! StateStoreError and the pipeline-level ProvisionError.

use std::io;
use thiserror::Error;

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Conflicting configuration: {0}")]
    ConflictDetected(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// External process execution errors.
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    /// The program could not be started at all (not found, permission denied)
    #[error("Failed to spawn '{cmd}': {reason}")]
    Spawn { cmd: String, reason: String },

    /// The program ran and exited unsuccessfully
    #[error("Command '{cmd}' exited with status {code:?}: {stderr}")]
    Exit {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl CommandError {
    /// Captured stderr of a failed run, empty for spawn failures
    pub fn stderr(&self) -> &str {
        match self {
            CommandError::Spawn { .. } => "",
            CommandError::Exit { stderr, .. } => stderr,
        }
    }
}

/// Artifact download and extraction errors.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("Archive member '{0}' not found")]
    MemberNotFound(String),

    #[error("IO error during fetch: {0}")]
    Io(#[from] io::Error),
}

/// Variable store access errors.
#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("Variable store not found at {0}")]
    Missing(String),

    #[error("Variable store is not valid YAML/JSON: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Field '{0}' missing from variable store")]
    FieldMissing(String),

    #[error("IO error reading variable store: {0}")]
    Io(#[from] io::Error),
}

/// Fatal provisioning errors. Any of these aborts the whole run.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Required tool '{tool}' is not available. Install it first: {hint}")]
    MissingPrerequisite { tool: String, hint: String },

    #[error("Development VM '{vm}' is not running. Start it first: {hint}")]
    PlatformUnavailable { vm: String, hint: String },

    #[error("No host interface carries address {0}; is the development VM on its private network?")]
    InterfaceNotFound(String),

    #[error("Failed to install tool '{tool}': {reason}")]
    ToolInstall { tool: String, reason: String },

    #[error("Tool '{0}' was not resolved by the dependency installer")]
    ToolUnresolved(String),

    #[error("Repository clone failed: {0}")]
    Clone(String),

    #[error("Network configuration failed: {0}")]
    Network(String),

    #[error("Director deploy failed: {0}")]
    Deploy(String),

    #[error("Credential extraction failed: {0}")]
    Credentials(String),

    #[error("Route configuration failed: {0}")]
    Route(String),

    #[error("Cloud config update failed: {0}")]
    CloudConfig(String),

    #[error("Pipeline state error: {0}")]
    Pipeline(String),

    #[error("Run cancelled before step '{0}'")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProvisionError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::Cancelled(_) => 130,
            _ => 1,
        }
    }
}

impl From<StateStoreError> for ProvisionError {
    fn from(e: StateStoreError) -> Self {
        ProvisionError::Credentials(e.to_string())
    }
}

/// Top-level result type for operations that may fail.
/// Use this as the return type for binary-level glue.
/// Example: `fn risky_operation() -> Result<String>`
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::FileNotFound("/etc/devbox.toml".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /etc/devbox.toml"
        );
    }

    #[test]
    fn test_command_error_stderr() {
        let err = CommandError::Exit {
            cmd: "VBoxManage natnetwork add".to_string(),
            code: Some(1),
            stderr: "already exists".to_string(),
        };
        assert_eq!(err.stderr(), "already exists");

        let spawn = CommandError::Spawn {
            cmd: "bosh".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(spawn.stderr(), "");
    }

    #[test]
    fn test_missing_prerequisite_names_tool_and_hint() {
        let err = ProvisionError::MissingPrerequisite {
            tool: "VBoxManage".to_string(),
            hint: "https://www.virtualbox.org/wiki/Downloads".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("VBoxManage"));
        assert!(msg.contains("virtualbox.org"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_cancelled_exit_code() {
        assert_eq!(ProvisionError::Cancelled("routes".into()).exit_code(), 130);
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err("test error".into());
        assert!(result.is_err());
    }
}
