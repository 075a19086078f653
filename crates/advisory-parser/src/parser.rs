//! Parser for the yarn npm audit JSON report.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::advisory::Advisory;
use crate::error::AdvisoryError;

#[derive(Deserialize)]
struct AuditReport {
    /// Map of opaque advisory ids to advisory records.
    #[serde(default)]
    advisories: BTreeMap<String, Value>,
}

/// Parse a yarn npm audit JSON report into advisory records.
///
/// The report maps opaque ids to records; ids become the advisory's
/// `id` field unless the record carries its own. Records missing
/// `module_name`, `vulnerable_versions`, or `patched_versions` fail
/// the whole parse with a descriptive error, so a malformed report is
/// rejected before remediation starts. Unknown fields are ignored.
///
/// Output order follows the report's id order (BTreeMap) so repeated
/// runs over the same report process advisories deterministically.
pub fn parse_audit_report(stdout: &str) -> Result<Vec<Advisory>, AdvisoryError> {
    let report: AuditReport = serde_json::from_str(stdout)
        .map_err(|e| AdvisoryError::ParseFailed(e.to_string()))?;

    let mut advisories = Vec::with_capacity(report.advisories.len());
    for (id, record) in report.advisories {
        let mut advisory: Advisory = serde_json::from_value(record)
            .map_err(|e| AdvisoryError::ParseFailed(format!("advisory {}: {}", id, e)))?;
        if advisory.id.is_none() {
            advisory.id = Some(id);
        }
        advisories.push(advisory);
    }

    Ok(advisories)
}
