use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use super::ProjectError;

/// A version range: a `||` union of comparator sets.
///
/// Satisfaction is delegated to `semver::VersionReq`, which keeps its
/// prerelease opt-in rules: a prerelease version only matches a
/// comparator that itself carries a prerelease tag. The only work done
/// here is translating npm's range syntax (space-joined comparators,
/// `||` alternatives, hyphen ranges) into comparator sets the semver
/// crate accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    raw: String,
    #[serde(skip)]
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    pub fn parse(raw: &str) -> Result<Self, ProjectError> {
        let mut alternatives = Vec::new();
        for alternative in raw.split("||") {
            let alternative = alternative.trim();
            if alternative.is_empty() {
                continue;
            }
            let req = parse_comparator_set(alternative)
                .ok_or_else(|| ProjectError::InvalidRange(raw.to_string()))?;
            alternatives.push(req);
        }
        if alternatives.is_empty() {
            return Err(ProjectError::InvalidRange(raw.to_string()));
        }
        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// Whether `version` satisfies any alternative of this range.
    pub fn satisfies(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_comparator_set(alternative: &str) -> Option<VersionReq> {
    if alternative == "*" {
        return Some(VersionReq::STAR);
    }
    // Hyphen range: `1.2.3 - 2.0.0` means >=1.2.3, <=2.0.0
    if let Some((low, high)) = alternative.split_once(" - ") {
        return VersionReq::parse(&format!(">={}, <={}", low.trim(), high.trim())).ok();
    }
    // npm joins comparators with whitespace, semver wants commas
    let comma_joined = alternative.split_whitespace().collect::<Vec<_>>().join(", ");
    VersionReq::parse(&comma_joined).ok()
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for VersionRange {}

impl std::hash::Hash for VersionRange {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = ProjectError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.raw
    }
}
