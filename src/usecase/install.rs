use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// How much work the post-remediation install should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstallMode {
    /// Refresh resolution bookkeeping without building artifacts
    #[default]
    UpdateLockfile,
    /// Resolve and fetch, but skip build scripts
    SkipBuild,
}

impl InstallMode {
    pub fn as_flag(&self) -> &'static str {
        match self {
            InstallMode::UpdateLockfile => "--mode=update-lockfile",
            InstallMode::SkipBuild => "--mode=skip-build",
        }
    }
}

/// Errors from the install step.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Failed to spawn yarn install: {0}")]
    SpawnFailed(String),

    #[error("yarn install exited with {0}")]
    Failed(i32),
}

/// The install step collaborator, invoked once after all advisories
/// are processed so the committed fixes are written back.
pub trait Installer {
    fn install(
        &self,
        mode: InstallMode,
    ) -> impl std::future::Future<Output = Result<(), InstallError>> + Send;
}

/// Installer that runs `yarn install` in the project root.
#[derive(Debug, Clone)]
pub struct YarnInstaller {
    yarn_path: String,
    project_root: PathBuf,
}

impl YarnInstaller {
    pub fn new(yarn_path: impl Into<String>, project_root: &Path) -> Self {
        Self {
            yarn_path: yarn_path.into(),
            project_root: project_root.to_path_buf(),
        }
    }
}

impl Installer for YarnInstaller {
    async fn install(&self, mode: InstallMode) -> Result<(), InstallError> {
        debug!("running yarn install {}", mode.as_flag());
        let status = tokio::process::Command::new(&self.yarn_path)
            .arg("install")
            .arg(mode.as_flag())
            .current_dir(&self.project_root)
            .status()
            .await
            .map_err(|e| InstallError::SpawnFailed(e.to_string()))?;

        if !status.success() {
            return Err(InstallError::Failed(status.code().unwrap_or(-1)));
        }
        Ok(())
    }
}
