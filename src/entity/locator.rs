use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use semver::Version;
use serde::{Deserialize, Serialize};

use super::Ident;

/// Stable content-derived key for a (ident, version) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocatorHash(u64);

impl std::fmt::Display for LocatorHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A concrete resolved package instance: ident + exact version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LocatorParts", into = "LocatorParts")]
pub struct Locator {
    ident: Ident,
    version: Version,
    hash: LocatorHash,
}

impl Locator {
    pub fn new(ident: Ident, version: Version) -> Self {
        let mut hasher = DefaultHasher::new();
        ident.hash(&mut hasher);
        version.to_string().hash(&mut hasher);
        let hash = LocatorHash(hasher.finish());
        Self {
            ident,
            version,
            hash,
        }
    }

    pub fn ident(&self) -> &Ident {
        &self.ident
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn hash(&self) -> LocatorHash {
        self.hash
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.ident, self.version)
    }
}

/// Serialized form: content only, hash recomputed on load.
#[derive(Serialize, Deserialize)]
struct LocatorParts {
    ident: Ident,
    version: Version,
}

impl From<LocatorParts> for Locator {
    fn from(parts: LocatorParts) -> Self {
        Locator::new(parts.ident, parts.version)
    }
}

impl From<Locator> for LocatorParts {
    fn from(locator: Locator) -> Self {
        LocatorParts {
            ident: locator.ident,
            version: locator.version,
        }
    }
}
