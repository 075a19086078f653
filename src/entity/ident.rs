use serde::{Deserialize, Serialize};

use super::ProjectError;

/// A package name, optionally scoped.
///
/// Equality is structural over (scope, name) so two idents compare
/// equal regardless of how the original string was formatted.
/// Ordering is scope-then-name, with unscoped names first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub scope: Option<String>,
    pub name: String,
}

impl Ident {
    pub fn new(scope: Option<&str>, name: &str) -> Self {
        Self {
            scope: scope.map(|s| s.to_string()),
            name: name.to_string(),
        }
    }

    /// Parse `name` or `@scope/name`.
    pub fn parse(raw: &str) -> Result<Self, ProjectError> {
        if let Some(rest) = raw.strip_prefix('@') {
            let Some((scope, name)) = rest.split_once('/') else {
                return Err(ProjectError::InvalidIdent(raw.to_string()));
            };
            if scope.is_empty() || name.is_empty() || name.contains('/') {
                return Err(ProjectError::InvalidIdent(raw.to_string()));
            }
            Ok(Self::new(Some(scope), name))
        } else {
            if raw.is_empty() || raw.contains('/') {
                return Err(ProjectError::InvalidIdent(raw.to_string()));
            }
            Ok(Self::new(None, raw))
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{}/{}", scope, self.name),
            None => f.write_str(&self.name),
        }
    }
}
