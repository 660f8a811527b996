//! Cloud config upload, authenticated with the generated profile.
//!
//! Uploading the same document again is a no-op on the director side, so the
//! step always runs.

use super::DIRECTOR_TOOL;
use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use crate::profile::load_assignments;
use async_trait::async_trait;
use std::path::Path;

/// Baseline document written when no cloud config is configured
pub const DEFAULT_CLOUD_CONFIG: &str = include_str!("../../../assets/cloud-config.yml");

pub struct CloudConfigPublisher;

/// Make sure the document at `path` exists before upload.
///
/// A missing explicitly configured document is an error; a missing default
/// document is written from the bundled copy. Existing files are never touched.
pub fn materialize_document(path: &Path, explicit: bool) -> Result<(), ProvisionError> {
    if path.is_file() {
        return Ok(());
    }
    if explicit {
        return Err(ProvisionError::CloudConfig(format!(
            "cloud config {} does not exist",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CLOUD_CONFIG)?;
    log::info!("[CloudConfig] Wrote default document to {}", path.display());
    Ok(())
}

#[async_trait]
impl Step for CloudConfigPublisher {
    fn name(&self) -> &'static str {
        "cloud_config"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let profile_path = ctx.profile_path();
        let env = load_assignments(&profile_path).map_err(|e| {
            ProvisionError::CloudConfig(format!(
                "reading profile {}: {}",
                profile_path.display(),
                e
            ))
        })?;

        let document = ctx.config.cloud_config_path(&ctx.paths);
        materialize_document(&document, ctx.config.cloud_config.is_some())?;

        let binary = ctx.registry.resolve(DIRECTOR_TOOL)?.to_path_buf();
        ctx.tools
            .director
            .update_cloud_config(&binary, &env, &document)
            .await
            .map_err(|e| ProvisionError::CloudConfig(e.to_string()))?;

        log::info!("[CloudConfig] Uploaded {}", document.display());
        Ok(StepOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_document_written_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cloud-config.yml");

        materialize_document(&path, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CLOUD_CONFIG);

        std::fs::write(&path, "custom: true\n").unwrap();
        materialize_document(&path, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "custom: true\n");
    }

    #[test]
    fn test_missing_configured_document_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.yml");
        let result = materialize_document(&missing, true);
        assert!(matches!(result, Err(ProvisionError::CloudConfig(_))));
        assert!(!missing.exists());
    }

    #[test]
    fn test_bundled_document_is_valid_yaml() {
        let doc: serde_yaml::Value = serde_yaml::from_str(DEFAULT_CLOUD_CONFIG).unwrap();
        assert!(doc.get("networks").is_some());
        assert!(doc.get("compilation").is_some());
    }
}
