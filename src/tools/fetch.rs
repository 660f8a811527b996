//! Artifact download and installation into the binary cache.

use super::ArtifactFetcher;
use crate::error::FetchError;
use crate::models::{InstallSource, ToolDependency};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Production fetcher over HTTPS.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        HttpFetcher {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("[Fetch] GET {}", url);

        let http_err = |e: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(http_err)?
            .error_for_status()
            .map_err(http_err)?;

        let bytes = response.bytes().await.map_err(http_err)?;
        log::debug!("[Fetch] Received {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Pull `member` out of a gzip tarball.
///
/// Entries match on their final path component, so `cf8` matches both
/// `cf8` and `./bin/cf8`.
pub fn extract_member(archive: &[u8], member: &str) -> Result<Vec<u8>, FetchError> {
    let mut tarball = tar::Archive::new(GzDecoder::new(archive));

    for entry in tarball.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let matches = entry
            .path()?
            .file_name()
            .map_or(false, |name| name == member);
        if matches {
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            return Ok(contents);
        }
    }

    Err(FetchError::MemberNotFound(member.to_string()))
}

/// Write a downloaded artifact to the tool's install path and apply its mode.
///
/// # Returns
/// The installed executable's path.
pub fn install_artifact(
    tool: &ToolDependency,
    artifact: &[u8],
    bin_dir: &Path,
) -> Result<PathBuf, FetchError> {
    let contents = match &tool.source {
        InstallSource::Binary { .. } => artifact.to_vec(),
        InstallSource::Archive { member, .. } => extract_member(artifact, member)?,
    };

    let target = tool.install_path(bin_dir);
    std::fs::create_dir_all(bin_dir)?;
    std::fs::write(&target, contents)?;
    set_mode(&target, tool.mode)?;

    Ok(target)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
