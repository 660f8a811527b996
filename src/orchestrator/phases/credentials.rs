//! Credential extraction from the variable store.
//!
//! Always runs, even when the director was already deployed, so the CA
//! certificate, jumpbox key and profile match the current variable store.

use crate::error::ProvisionError;
use crate::models::StepOutcome;
use crate::orchestrator::{ProvisionContext, Step};
use crate::profile::EnvironmentProfile;
use crate::state_store::{ADMIN_PASSWORD_PATH, CA_CERT_PATH, JUMPBOX_KEY_PATH};
use async_trait::async_trait;
use std::io;
use std::path::Path;

pub struct CredentialExtractor;

fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)
}

#[cfg(unix)]
fn restrict(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[async_trait]
impl Step for CredentialExtractor {
    fn name(&self) -> &'static str {
        "credentials"
    }

    async fn run(&self, ctx: &mut ProvisionContext) -> Result<StepOutcome, ProvisionError> {
        let vars = ctx.tools.state.load_variables(&ctx.vars_store_path())?;
        let ca_cert = vars.get_str(CA_CERT_PATH)?;
        let private_key = vars.get_str(JUMPBOX_KEY_PATH)?;
        let admin_password = vars.get_str(ADMIN_PASSWORD_PATH)?;

        let profile_cfg = &ctx.config.profile;
        let io_err = |what: &str, path: &Path, e: io::Error| {
            ProvisionError::Credentials(format!("writing {} {}: {}", what, path.display(), e))
        };

        write_file(&profile_cfg.ca_cert_path, &ca_cert)
            .map_err(|e| io_err("CA certificate", &profile_cfg.ca_cert_path, e))?;
        write_file(&profile_cfg.private_key_path, &private_key)
            .and_then(|_| restrict(&profile_cfg.private_key_path))
            .map_err(|e| io_err("private key", &profile_cfg.private_key_path, e))?;

        let director = &ctx.config.director;
        let profile = EnvironmentProfile {
            environment: director.environment.clone(),
            client: director.client.clone(),
            client_secret: admin_password,
            url: director.url(),
            ca_cert_path: profile_cfg.ca_cert_path.clone(),
        };

        let profile_path = ctx.config.profile_path(&ctx.checkout_dir());
        profile
            .write(&profile_path)
            .map_err(|e| io_err("profile", &profile_path, e))?;

        log::info!("[Credentials] Profile written to {}", profile_path.display());
        ctx.profile_path = Some(profile_path);
        Ok(StepOutcome::Completed)
    }
}
