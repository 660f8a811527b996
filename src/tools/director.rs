//! Director CLI adapter.

use super::DirectorCli;
use crate::error::CommandError;
use crate::models::ManifestOverlaySet;
use crate::system::{self, Invocation};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Everything `create-env` needs for a first deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Manifest paths already rooted at the checkout
    pub manifests: ManifestOverlaySet,
    pub state_file: PathBuf,
    /// Written by the deploy on first run; read by every later run
    pub vars_store: PathBuf,
}

impl DeployRequest {
    /// `create-env <base> --state S --vars-store V [-o overlay]... [-v k=v]...`
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "create-env".to_string(),
            self.manifests.base_manifest.to_string_lossy().to_string(),
            "--state".to_string(),
            self.state_file.to_string_lossy().to_string(),
            "--vars-store".to_string(),
            self.vars_store.to_string_lossy().to_string(),
        ];
        args.extend(self.manifests.to_args());
        args
    }
}

/// Production director CLI; the binary path is supplied per call.
#[derive(Debug, Clone, Default)]
pub struct BoshCli;

impl BoshCli {
    pub fn new() -> Self {
        BoshCli
    }

    pub fn cloud_config_invocation(
        binary: &Path,
        env: &[(String, String)],
        document: &Path,
    ) -> Invocation {
        let mut inv = Invocation::new(binary).args([
            "update-cloud-config".to_string(),
            "-n".to_string(),
            document.to_string_lossy().to_string(),
        ]);
        for (key, value) in env {
            inv = inv.env(key.as_str(), value.as_str());
        }
        inv
    }
}

#[async_trait]
impl DirectorCli for BoshCli {
    async fn create_env(&self, binary: &Path, request: &DeployRequest) -> Result<(), CommandError> {
        let inv = Invocation::new(binary).args(request.to_args()).streaming();
        system::run(&inv).await.map(|_| ())
    }

    async fn update_cloud_config(
        &self,
        binary: &Path,
        env: &[(String, String)],
        document: &Path,
    ) -> Result<(), CommandError> {
        let inv = Self::cloud_config_invocation(binary, env, document);
        system::run(&inv).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_args_keep_overlay_order() {
        let manifests = ManifestOverlaySet::new("bosh.yml")
            .overlay("virtualbox/cpi.yml")
            .overlay("bosh-lite.yml")
            .variable("network_name", "vboxnet0")
            .rooted_at(Path::new("/w/lib/bosh-deployment"));
        let request = DeployRequest {
            manifests,
            state_file: PathBuf::from("/w/lib/bosh-deployment/state.json"),
            vars_store: PathBuf::from("/w/lib/bosh-deployment/creds.yml"),
        };

        assert_eq!(
            request.to_args(),
            vec![
                "create-env",
                "/w/lib/bosh-deployment/bosh.yml",
                "--state",
                "/w/lib/bosh-deployment/state.json",
                "--vars-store",
                "/w/lib/bosh-deployment/creds.yml",
                "-o",
                "/w/lib/bosh-deployment/virtualbox/cpi.yml",
                "-o",
                "/w/lib/bosh-deployment/bosh-lite.yml",
                "-v",
                "network_name=vboxnet0",
            ]
        );
    }

    #[test]
    fn test_cloud_config_invocation() {
        let env = vec![("BOSH_ENVIRONMENT".to_string(), "https://192.168.11.6:25555".to_string())];
        let inv = BoshCli::cloud_config_invocation(
            Path::new("/w/bin/bosh"),
            &env,
            Path::new("/w/cloud-config.yml"),
        );
        assert_eq!(inv.display(), "/w/bin/bosh update-cloud-config -n /w/cloud-config.yml");
        assert_eq!(inv.env, env);
        assert!(!inv.stream);
    }
}
