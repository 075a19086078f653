//! AuditSource: run yarn npm audit and parse the report.

use std::path::{Path, PathBuf};

use crate::advisory::{Advisory, Severity};
use crate::error::AdvisoryError;
use crate::parser::parse_audit_report;

/// Dependency environment scope passed through to the audit command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuditEnvironment {
    #[default]
    All,
    Production,
    Development,
}

impl AuditEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEnvironment::All => "all",
            AuditEnvironment::Production => "production",
            AuditEnvironment::Development => "development",
        }
    }
}

/// Pass-through filtering options for the audit command.
///
/// These mirror the audit command's own flags; filtering happens in
/// the subprocess, not here.
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Audit all workspaces
    pub all_workspaces: bool,
    /// Audit transitive dependencies too
    pub recursive: bool,
    /// Environment scope
    pub environment: AuditEnvironment,
    /// Minimum severity to report
    pub severity: Option<Severity>,
    /// Package glob patterns to exclude from the report
    pub excludes: Vec<String>,
    /// Advisory id globs to ignore
    pub ignores: Vec<String>,
}

impl AuditOptions {
    fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "npm".to_string(),
            "audit".to_string(),
            "--json".to_string(),
        ];
        if self.all_workspaces {
            args.push("--all".to_string());
        }
        if self.recursive {
            args.push("--recursive".to_string());
        }
        if self.environment != AuditEnvironment::All {
            args.push("--environment".to_string());
            args.push(self.environment.as_str().to_string());
        }
        if let Some(severity) = self.severity {
            args.push("--severity".to_string());
            args.push(severity.as_str().to_string());
        }
        for exclude in &self.excludes {
            args.push("--exclude".to_string());
            args.push(exclude.clone());
        }
        for ignore in &self.ignores {
            args.push("--ignore".to_string());
            args.push(ignore.clone());
        }
        args
    }
}

/// Runs the audit subprocess in a project directory.
#[derive(Debug, Clone)]
pub struct AuditSource {
    yarn_path: String,
    project_root: PathBuf,
}

impl AuditSource {
    pub fn new(yarn_path: impl Into<String>, project_root: &Path) -> Self {
        Self {
            yarn_path: yarn_path.into(),
            project_root: project_root.to_path_buf(),
        }
    }

    /// Run `yarn npm audit --json` and parse the advisories.
    ///
    /// The audit command exits non-zero when it finds vulnerabilities,
    /// so the exit status is ignored; only empty or unparsable output
    /// is an error.
    pub async fn advisories(&self, options: &AuditOptions) -> Result<Vec<Advisory>, AdvisoryError> {
        let output = tokio::process::Command::new(&self.yarn_path)
            .args(options.to_args())
            .current_dir(&self.project_root)
            .output()
            .await
            .map_err(|e| AdvisoryError::SpawnFailed(e.to_string()))?;

        if output.stdout.is_empty() {
            return Err(AdvisoryError::EmptyOutput);
        }

        let stdout_str = String::from_utf8_lossy(&output.stdout);
        parse_audit_report(&stdout_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let options = AuditOptions::default();
        assert_eq!(options.to_args(), vec!["npm", "audit", "--json"]);
    }

    #[test]
    fn test_full_args() {
        let options = AuditOptions {
            all_workspaces: true,
            recursive: true,
            environment: AuditEnvironment::Production,
            severity: Some(Severity::Moderate),
            excludes: vec!["@internal/*".to_string()],
            ignores: vec!["118".to_string()],
        };
        assert_eq!(
            options.to_args(),
            vec![
                "npm",
                "audit",
                "--json",
                "--all",
                "--recursive",
                "--environment",
                "production",
                "--severity",
                "moderate",
                "--exclude",
                "@internal/*",
                "--ignore",
                "118",
            ]
        );
    }
}
