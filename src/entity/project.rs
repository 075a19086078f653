use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Descriptor, DescriptorHash, LocatorHash, Package, ProjectError};

/// The installed dependency graph, hash-indexed.
///
/// Holds the descriptor set, the resolution mapping (descriptor hash
/// to locator hash), the package store (locator hash to package), and
/// the resolution alias layer remediation writes into. Descriptors are
/// kept in insertion order so traversal is deterministic for a fixed
/// graph.
///
/// The graph is built by the install pipeline and exchanged with it
/// through the JSON snapshot format of [`Project::load`] and
/// [`Project::save`].
#[derive(Debug, Default)]
pub struct Project {
    order: Vec<DescriptorHash>,
    descriptors: HashMap<DescriptorHash, Descriptor>,
    resolutions: HashMap<DescriptorHash, LocatorHash>,
    packages: HashMap<LocatorHash, Package>,
    resolution_aliases: HashMap<DescriptorHash, DescriptorHash>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor to the descriptor set. Idempotent: an already
    /// registered descriptor keeps its original insertion position.
    pub fn register_descriptor(&mut self, descriptor: Descriptor) -> DescriptorHash {
        let hash = descriptor.hash();
        if self.descriptors.insert(hash, descriptor).is_none() {
            self.order.push(hash);
        }
        hash
    }

    /// Add a package to the package store, keyed by its locator hash.
    pub fn insert_package(&mut self, package: Package) -> LocatorHash {
        let hash = package.locator().hash();
        self.packages.insert(hash, package);
        hash
    }

    /// Record that a descriptor resolves to a locator.
    pub fn set_resolution(
        &mut self,
        descriptor: DescriptorHash,
        locator: LocatorHash,
    ) -> Result<(), ProjectError> {
        if !self.descriptors.contains_key(&descriptor) {
            return Err(ProjectError::UnknownDescriptor(descriptor.to_string()));
        }
        self.resolutions.insert(descriptor, locator);
        Ok(())
    }

    /// Redirect a descriptor's future resolution through another
    /// registered descriptor. Aliases only accumulate; re-aliasing the
    /// same source overwrites, so the last successful commit wins.
    pub fn set_resolution_alias(
        &mut self,
        from: DescriptorHash,
        to: DescriptorHash,
    ) -> Result<(), ProjectError> {
        if from == to {
            return Err(ProjectError::SelfAlias(from.to_string()));
        }
        if !self.descriptors.contains_key(&from) {
            return Err(ProjectError::UnknownDescriptor(from.to_string()));
        }
        if !self.descriptors.contains_key(&to) {
            return Err(ProjectError::UnknownDescriptor(to.to_string()));
        }
        self.resolution_aliases.insert(from, to);
        Ok(())
    }

    pub fn descriptor(&self, hash: DescriptorHash) -> Option<&Descriptor> {
        self.descriptors.get(&hash)
    }

    /// Descriptors in insertion order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.order.iter().filter_map(|hash| self.descriptors.get(hash))
    }

    pub fn resolution(&self, descriptor: DescriptorHash) -> Option<LocatorHash> {
        self.resolutions.get(&descriptor).copied()
    }

    pub fn resolution_alias(&self, descriptor: DescriptorHash) -> Option<DescriptorHash> {
        self.resolution_aliases.get(&descriptor).copied()
    }

    /// Whether some descriptor is currently aliased onto this one.
    pub fn is_alias_target(&self, descriptor: DescriptorHash) -> bool {
        self.resolution_aliases
            .values()
            .any(|target| *target == descriptor)
    }

    pub fn package(&self, locator: LocatorHash) -> Option<&Package> {
        self.packages.get(&locator)
    }

    /// The package a descriptor currently resolves to, if any.
    pub fn resolved_package(&self, descriptor: DescriptorHash) -> Option<&Package> {
        self.packages.get(self.resolutions.get(&descriptor)?)
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn alias_count(&self) -> usize {
        self.resolution_aliases.len()
    }

    /// Load a project from an install-state snapshot.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let text = std::fs::read_to_string(path).map_err(|e| ProjectError::SnapshotRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot: ProjectSnapshot =
            serde_json::from_str(&text).map_err(|e| ProjectError::SnapshotParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_snapshot(snapshot)
    }

    /// Write the project back as an install-state snapshot, including
    /// the alias layer, for the next install to pick up.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let snapshot = self.to_snapshot();
        let text = serde_json::to_string_pretty(&snapshot)
            .expect("snapshot serialization is infallible");
        std::fs::write(path, text).map_err(|e| ProjectError::SnapshotWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn from_snapshot(snapshot: ProjectSnapshot) -> Result<Self, ProjectError> {
        let mut project = Self::new();

        let mut descriptor_hashes = Vec::with_capacity(snapshot.descriptors.len());
        for descriptor in snapshot.descriptors {
            descriptor_hashes.push(project.register_descriptor(descriptor));
        }

        let mut locator_hashes = Vec::with_capacity(snapshot.packages.len());
        for package in snapshot.packages {
            locator_hashes.push(project.insert_package(package));
        }

        let descriptor_at = |idx: usize| {
            descriptor_hashes
                .get(idx)
                .copied()
                .ok_or(ProjectError::SnapshotIndex(idx))
        };
        for (descriptor_idx, package_idx) in snapshot.resolutions {
            let locator = locator_hashes
                .get(package_idx)
                .copied()
                .ok_or(ProjectError::SnapshotIndex(package_idx))?;
            project.set_resolution(descriptor_at(descriptor_idx)?, locator)?;
        }
        for (from_idx, to_idx) in snapshot.aliases {
            project.set_resolution_alias(descriptor_at(from_idx)?, descriptor_at(to_idx)?)?;
        }

        Ok(project)
    }

    fn to_snapshot(&self) -> ProjectSnapshot {
        let descriptor_index: HashMap<DescriptorHash, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(idx, hash)| (*hash, idx))
            .collect();

        let mut packages: Vec<&Package> = self.packages.values().collect();
        packages.sort_by(|a, b| (&a.ident, &a.version).cmp(&(&b.ident, &b.version)));
        let package_index: HashMap<LocatorHash, usize> = packages
            .iter()
            .enumerate()
            .map(|(idx, package)| (package.locator().hash(), idx))
            .collect();

        let mut resolutions: Vec<(usize, usize)> = self
            .resolutions
            .iter()
            .filter_map(|(descriptor, locator)| {
                Some((
                    *descriptor_index.get(descriptor)?,
                    *package_index.get(locator)?,
                ))
            })
            .collect();
        resolutions.sort();

        let mut aliases: Vec<(usize, usize)> = self
            .resolution_aliases
            .iter()
            .filter_map(|(from, to)| {
                Some((*descriptor_index.get(from)?, *descriptor_index.get(to)?))
            })
            .collect();
        aliases.sort();

        ProjectSnapshot {
            descriptors: self.descriptors().cloned().collect(),
            packages: packages.into_iter().cloned().collect(),
            resolutions,
            aliases,
        }
    }
}

/// Install-state snapshot exchanged with the install pipeline.
///
/// Hashes are content-derived and recomputed on load, so the snapshot
/// stores entries once and cross-references them by index (JSON map
/// keys must be strings, and the hashes are not portable across
/// processes anyway).
#[derive(Debug, Serialize, Deserialize)]
struct ProjectSnapshot {
    /// Descriptor set in insertion order
    descriptors: Vec<Descriptor>,
    /// Package store; the locator is derivable from each entry
    packages: Vec<Package>,
    /// Resolution mapping as (descriptor index, package index) pairs
    resolutions: Vec<(usize, usize)>,
    /// Alias layer as (descriptor index, descriptor index) pairs
    aliases: Vec<(usize, usize)>,
}
