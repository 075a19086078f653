use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Config {
    /// Skip virtual descriptors when matching advisories
    pub skip_virtual: bool,
    /// Registry the candidate resolver queries
    pub registry_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_virtual: true,
            registry_url: default_registry_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(default = "default_true")]
    pub skip_virtual: bool,
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            skip_virtual: true,
            registry_url: default_registry_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_registry_url() -> String {
    "https://registry.npmjs.org".to_string()
}

pub static GLOBAL_CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));

pub fn initialize_config(config: UserConfig) {
    let mut global_config = GLOBAL_CONFIG.write().unwrap();
    *global_config = Config {
        skip_virtual: config.skip_virtual,
        registry_url: config.registry_url,
    };
    debug!("config {:?}", global_config);
}

/// Read the optional user config file from the project root.
pub fn load_user_config(project_root: &Path) -> Result<UserConfig, WorkspaceError> {
    let path = project_root.join(".npm-audit-fix.json");
    if !path.exists() {
        return Ok(UserConfig::default());
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|e| WorkspaceError::ConfigRead(path.clone(), e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| WorkspaceError::ConfigRead(path, e.to_string()))
}

/// Errors from workspace discovery and configuration loading. These
/// are setup failures: they abort the run before remediation starts.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no yarn project (yarn.lock) found at or above {0}")]
    ProjectNotFound(PathBuf),

    #[error("failed to read config {0}: {1}")]
    ConfigRead(PathBuf, String),
}

/// Walk up from `start` to the nearest directory containing a
/// yarn.lock. That directory is the project root.
pub fn find_project_root(start: &Path) -> Result<PathBuf, WorkspaceError> {
    for dir in start.ancestors() {
        if dir.join("yarn.lock").is_file() {
            return Ok(dir.to_path_buf());
        }
    }
    Err(WorkspaceError::ProjectNotFound(start.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("yarn.lock"), "").unwrap();
        let nested = root.join("packages/app/src");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_project_root(&nested).unwrap();
        assert_eq!(found, root);
    }

    #[test]
    fn test_find_project_root_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_project_root(dir.path()),
            Err(WorkspaceError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_load_user_config_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_user_config(dir.path()).unwrap();
        assert!(config.skip_virtual);
        assert_eq!(config.registry_url, "https://registry.npmjs.org");
    }

    #[test]
    fn test_load_user_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".npm-audit-fix.json"),
            r#"{"skipVirtual": false, "registryUrl": "https://registry.example.com"}"#,
        )
        .unwrap();
        let config = load_user_config(dir.path()).unwrap();
        assert!(!config.skip_virtual);
        assert_eq!(config.registry_url, "https://registry.example.com");
    }

    #[test]
    fn test_load_user_config_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".npm-audit-fix.json"), "{nope").unwrap();
        assert!(load_user_config(dir.path()).is_err());
    }
}
