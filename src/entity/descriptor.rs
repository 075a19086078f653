use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use semver::Version;
use serde::{Deserialize, Serialize};

use super::{Ident, Locator, VersionRange};

/// Stable content-derived key for a (ident, range) pair.
///
/// Computed with a fixed-key hasher at construction time, so equal
/// content always yields the same key within a run. Snapshots store
/// the content and recompute hashes on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorHash(u64);

impl std::fmt::Display for DescriptorHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A request for a package satisfying a version range.
///
/// Many descriptors may share an ident; the hash uniquely identifies
/// the (ident, range, virtual) content and is the primary key for all
/// graph maps. The range is immutable once the descriptor is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DescriptorParts", into = "DescriptorParts")]
pub struct Descriptor {
    ident: Ident,
    range: VersionRange,
    is_virtual: bool,
    hash: DescriptorHash,
}

impl Descriptor {
    pub fn new(ident: Ident, range: VersionRange) -> Self {
        Self::build(ident, range, false)
    }

    /// A virtual descriptor: an install-pipeline artifact of
    /// peer-dependency deduplication, hashed apart from its base.
    pub fn new_virtual(ident: Ident, range: VersionRange) -> Self {
        Self::build(ident, range, true)
    }

    fn build(ident: Ident, range: VersionRange, is_virtual: bool) -> Self {
        let mut hasher = DefaultHasher::new();
        is_virtual.hash(&mut hasher);
        ident.hash(&mut hasher);
        range.hash(&mut hasher);
        let hash = DescriptorHash(hasher.finish());
        Self {
            ident,
            range,
            is_virtual,
            hash,
        }
    }

    /// A descriptor pinned to a locator's exact version.
    ///
    /// This is what remediation registers as an alias target: the next
    /// install resolves it straight to the patched version.
    pub fn from_locator(locator: &Locator) -> Self {
        let range = VersionRange::parse(&format!("={}", locator.version()))
            .expect("exact version ranges always parse");
        Self::new(locator.ident().clone(), range)
    }

    pub fn ident(&self) -> &Ident {
        &self.ident
    }

    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    pub fn hash(&self) -> DescriptorHash {
        self.hash
    }

    /// The exact version this descriptor pins, if its range is of the
    /// `=x.y.z` form produced by [`Descriptor::from_locator`].
    pub fn pinned_version(&self) -> Option<Version> {
        let raw = self.range.as_str().strip_prefix('=')?;
        Version::parse(raw.trim()).ok()
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.ident, self.range)
    }
}

/// Serialized form: content only, hash recomputed on load.
#[derive(Serialize, Deserialize)]
struct DescriptorParts {
    ident: Ident,
    range: VersionRange,
    #[serde(default)]
    is_virtual: bool,
}

impl From<DescriptorParts> for Descriptor {
    fn from(parts: DescriptorParts) -> Self {
        Descriptor::build(parts.ident, parts.range, parts.is_virtual)
    }
}

impl From<Descriptor> for DescriptorParts {
    fn from(descriptor: Descriptor) -> Self {
        DescriptorParts {
            ident: descriptor.ident,
            range: descriptor.range,
            is_virtual: descriptor.is_virtual,
        }
    }
}
