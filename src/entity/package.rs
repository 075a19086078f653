use semver::Version;
use serde::{Deserialize, Serialize};

use super::{Ident, Locator};

/// An installed package record.
///
/// The package store keys these by locator hash; the locator is
/// derivable from (ident, version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub ident: Ident,
    pub version: Version,
    /// Registry tarball the package was (or would be) fetched from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_tarball: Option<String>,
}

impl Package {
    pub fn new(ident: Ident, version: Version) -> Self {
        Self {
            ident,
            version,
            dist_tarball: None,
        }
    }

    pub fn locator(&self) -> Locator {
        Locator::new(self.ident.clone(), self.version.clone())
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.ident, self.version)
    }
}
