use super::{Ident, ProjectError, VersionRange};

/// A reported vulnerability with parsed ranges.
///
/// Built from advisory-parser's raw records; conversion is the
/// fail-fast point for malformed identifiers and ranges, so every
/// advisory that reaches the engine is well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub module_name: Ident,
    pub vulnerable_range: VersionRange,
    pub patched_range: VersionRange,
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub severity: Option<String>,
}

impl TryFrom<advisory_parser::Advisory> for Advisory {
    type Error = ProjectError;

    fn try_from(raw: advisory_parser::Advisory) -> Result<Self, Self::Error> {
        Ok(Self {
            module_name: Ident::parse(&raw.module_name)?,
            vulnerable_range: VersionRange::parse(&raw.vulnerable_versions)?,
            patched_range: VersionRange::parse(&raw.patched_versions)?,
            id: raw.id,
            title: raw.title,
            url: raw.url,
            severity: raw.severity.map(|s| s.to_string()),
        })
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({})", self.module_name, id),
            None => write!(f, "{}", self.module_name),
        }
    }
}
