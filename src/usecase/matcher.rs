use crate::entity::{Advisory, Descriptor, Package, Project};

/// Scan the graph for descriptors affected by one advisory.
///
/// Yields every descriptor whose ident structurally equals the
/// advisory's module name and whose currently installed version
/// satisfies the vulnerable range. Traversal follows the descriptor
/// set's insertion order, so the output is deterministic for a fixed
/// graph. Pure read: single pass, no mutation.
///
/// Descriptors without a resolution are skipped (dangling edges should
/// not occur, but the matcher does not fail on them). Virtual
/// descriptors are skipped when `skip_virtual` is set. Alias targets
/// are skipped too: they are remediation's own pinned artifacts, and
/// redirecting them further would chain aliases instead of re-aliasing
/// the source descriptor.
pub fn match_advisory<'a>(
    project: &'a Project,
    advisory: &'a Advisory,
    skip_virtual: bool,
) -> impl Iterator<Item = (&'a Descriptor, &'a Package)> + 'a {
    project.descriptors().filter_map(move |descriptor| {
        if skip_virtual && descriptor.is_virtual() {
            return None;
        }
        if project.is_alias_target(descriptor.hash()) {
            return None;
        }
        if descriptor.ident() != &advisory.module_name {
            return None;
        }
        let package = project.resolved_package(descriptor.hash())?;
        advisory
            .vulnerable_range
            .satisfies(&package.version)
            .then_some((descriptor, package))
    })
}
