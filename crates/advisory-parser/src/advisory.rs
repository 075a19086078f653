//! Advisory record types.

use serde::Deserialize;

/// One reported vulnerability from the audit report.
///
/// Ranges are kept as raw strings here; the remediation layer parses
/// them into its own range type and rejects malformed ranges there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Advisory {
    /// Affected package name, possibly scoped (e.g. `@babel/core`)
    pub module_name: String,
    /// Range of versions affected by the vulnerability
    pub vulnerable_versions: String,
    /// Range of versions containing the fix
    pub patched_versions: String,
    /// Advisory id as reported by the registry (filled from the report key)
    #[serde(default)]
    pub id: Option<String>,
    /// Short human-readable title
    #[serde(default)]
    pub title: Option<String>,
    /// Link to the advisory
    #[serde(default)]
    pub url: Option<String>,
    /// Reported severity
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Advisory severity as reported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Moderate);
        assert!(Severity::Moderate > Severity::Low);
        assert!(Severity::Low > Severity::Info);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Moderate.to_string(), "moderate");
        assert_eq!(Severity::Critical.to_string(), "critical");
    }
}
