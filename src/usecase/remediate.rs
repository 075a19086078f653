use tracing::debug;

use crate::entity::{Advisory, Descriptor, Package, Project};
use crate::report::ReportSink;

use super::matcher::match_advisory;
use super::resolver::Resolver;

/// Accumulated result of a remediation run.
///
/// A run never aborts on per-pair failures; counts and the sink's
/// events are the whole story, and the caller derives the exit code
/// from the sink's accumulated severity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemediationOutcome {
    /// Advisories that matched at least one installed descriptor
    pub matched_advisories: usize,
    /// Pairs committed to the alias layer
    pub upgraded: usize,
    /// Pairs left vulnerable (no candidates, unsatisfied patched
    /// range, or resolver failure)
    pub unresolved: usize,
}

impl RemediationOutcome {
    pub fn is_clean(&self) -> bool {
        self.unresolved == 0
    }
}

/// Remediate advisories against the project graph.
///
/// Advisories are processed strictly sequentially, and matched pairs
/// within an advisory strictly sequentially: the graph maps are shared
/// mutable state with no locking, so the only suspension points are
/// the two resolver calls. Per-pair failures are reported through the
/// sink and never abort the run.
///
/// Commits use the alias strategy: a new descriptor pinned to the
/// patched version is registered and the vulnerable descriptor's hash
/// is mapped to it in the resolution alias layer. The next
/// lockfile-refresh install converges aliased descriptors onto the
/// patched versions; pairs that could not be committed were surfaced
/// as Warning or Error events and stay visibly unresolved.
pub async fn remediate<R: Resolver>(
    advisories: &[Advisory],
    project: &mut Project,
    resolver: &R,
    report: &mut dyn ReportSink,
    skip_virtual: bool,
) -> RemediationOutcome {
    let mut outcome = RemediationOutcome::default();

    for advisory in advisories {
        // Matcher borrows the graph, commits mutate it: collect the
        // matched pairs before processing them.
        let pairs: Vec<(Descriptor, Package)> = match_advisory(project, advisory, skip_virtual)
            .map(|(descriptor, package)| (descriptor.clone(), package.clone()))
            .collect();

        if pairs.is_empty() {
            debug!("advisory {} matched nothing", advisory);
            continue;
        }

        outcome.matched_advisories += 1;
        let phase = format!("advisory {}", advisory);
        report.phase_start(&phase);

        for (descriptor, installed) in pairs {
            remediate_pair(advisory, &descriptor, &installed, project, resolver, report, &mut outcome)
                .await;
        }

        report.phase_end(&phase);
    }

    outcome
}

async fn remediate_pair<R: Resolver>(
    advisory: &Advisory,
    descriptor: &Descriptor,
    installed: &Package,
    project: &mut Project,
    resolver: &R,
    report: &mut dyn ReportSink,
    outcome: &mut RemediationOutcome,
) {
    // Idempotence: a pair already aliased onto a patched version is
    // done; emit nothing and mutate nothing.
    if already_remediated(project, descriptor, advisory) {
        debug!("{} already aliased to a patched version", descriptor);
        return;
    }

    let mut line = format!(
        "Found vulnerable {} (via {}, vulnerable range {})",
        installed, descriptor, advisory.vulnerable_range
    );
    if let Some(severity) = &advisory.severity {
        line.push_str(&format!(" [{}]", severity));
    }
    if let Some(title) = &advisory.title {
        line.push_str(&format!(": {}", title));
    }
    if let Some(url) = &advisory.url {
        line.push_str(&format!(" (see {})", url));
    }
    report.info(line);

    let candidates = match resolver.candidates(descriptor).await {
        Ok(candidates) => candidates,
        Err(e) => {
            report.error(format!("Failed to resolve {}: {}", descriptor, e));
            outcome.unresolved += 1;
            return;
        }
    };

    // The resolver's preference order is opaque here; always take the
    // first candidate.
    let Some(candidate) = candidates.into_iter().next() else {
        report.error(format!("No candidates found for {}", descriptor));
        outcome.unresolved += 1;
        return;
    };

    let patched = match resolver.resolve(&candidate).await {
        Ok(package) => package,
        Err(e) => {
            report.error(format!("Failed to resolve {}: {}", candidate, e));
            outcome.unresolved += 1;
            return;
        }
    };

    if !advisory.patched_range.satisfies(&patched.version) {
        report.warning(format!(
            "No compatible patched version found for {} (best candidate {} does not satisfy {})",
            descriptor,
            patched,
            advisory.patched_range
        ));
        outcome.unresolved += 1;
        return;
    }

    report.info(format!("Setting resolution for {} to {}", descriptor, patched));

    let alias_target = Descriptor::from_locator(&patched.locator());
    if alias_target.hash() == descriptor.hash() {
        // Already pinned to the patched version; nothing to redirect.
        outcome.upgraded += 1;
        return;
    }

    let locator_hash = project.insert_package(patched);
    let target_hash = project.register_descriptor(alias_target);
    // Both hashes were just registered, so these cannot fail.
    let _ = project.set_resolution(target_hash, locator_hash);
    let _ = project.set_resolution_alias(descriptor.hash(), target_hash);
    outcome.upgraded += 1;
}

/// Whether the descriptor is already aliased onto a descriptor pinned
/// to a version satisfying the advisory's patched range.
fn already_remediated(project: &Project, descriptor: &Descriptor, advisory: &Advisory) -> bool {
    let Some(target_hash) = project.resolution_alias(descriptor.hash()) else {
        return false;
    };
    let Some(target) = project.descriptor(target_hash) else {
        return false;
    };
    match target.pinned_version() {
        Some(version) => advisory.patched_range.satisfies(&version),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use semver::Version;

    use super::*;
    use crate::entity::{Ident, Locator, VersionRange};
    use crate::report::MemoryReport;
    use crate::usecase::resolver::ResolveError;

    /// Deterministic in-memory resolver. The listed versions are the
    /// registry's preference order (best first); a sequence of
    /// responses simulates registry state changing between calls.
    struct FakeRegistry {
        responses: std::sync::Mutex<HashMap<String, Vec<Vec<&'static str>>>>,
        fail_for: Option<String>,
    }

    impl FakeRegistry {
        fn new(entries: &[(&str, &[&'static str])]) -> Self {
            Self {
                responses: std::sync::Mutex::new(
                    entries
                        .iter()
                        .map(|(ident, versions)| (ident.to_string(), vec![versions.to_vec()]))
                        .collect(),
                ),
                fail_for: None,
            }
        }

        fn with_sequence(ident: &str, responses: &[&[&'static str]]) -> Self {
            Self {
                responses: std::sync::Mutex::new(HashMap::from([(
                    ident.to_string(),
                    responses.iter().map(|r| r.to_vec()).collect(),
                )])),
                fail_for: None,
            }
        }

        fn failing_for(mut self, ident: &str) -> Self {
            self.fail_for = Some(ident.to_string());
            self
        }
    }

    impl Resolver for FakeRegistry {
        async fn candidates(&self, descriptor: &Descriptor) -> Result<Vec<Locator>, ResolveError> {
            let key = descriptor.ident().to_string();
            if self.fail_for.as_deref() == Some(key.as_str()) {
                return Err(ResolveError::RequestFailed(key, "connection reset".into()));
            }
            let mut responses = self.responses.lock().unwrap();
            let Some(sequence) = responses.get_mut(&key) else {
                return Ok(Vec::new());
            };
            // consume the sequence, repeating the last response
            let current = if sequence.len() > 1 {
                sequence.remove(0)
            } else {
                sequence[0].clone()
            };
            Ok(current
                .into_iter()
                .map(|v| Version::parse(v).unwrap())
                .filter(|v| descriptor.range().satisfies(v))
                .map(|v| Locator::new(descriptor.ident().clone(), v))
                .collect())
        }

        async fn resolve(&self, locator: &Locator) -> Result<Package, ResolveError> {
            Ok(Package::new(locator.ident().clone(), locator.version().clone()))
        }
    }

    fn advisory(module: &str, vulnerable: &str, patched: &str) -> Advisory {
        Advisory {
            module_name: Ident::parse(module).unwrap(),
            vulnerable_range: VersionRange::parse(vulnerable).unwrap(),
            patched_range: VersionRange::parse(patched).unwrap(),
            id: None,
            title: None,
            url: None,
            severity: None,
        }
    }

    fn project_with(entries: &[(&str, &str, &str)]) -> Project {
        let mut project = Project::new();
        for (ident, range, version) in entries {
            let descriptor = Descriptor::new(
                Ident::parse(ident).unwrap(),
                VersionRange::parse(range).unwrap(),
            );
            let package = Package::new(
                Ident::parse(ident).unwrap(),
                Version::parse(version).unwrap(),
            );
            let descriptor_hash = project.register_descriptor(descriptor);
            let locator_hash = project.insert_package(package);
            project.set_resolution(descriptor_hash, locator_hash).unwrap();
        }
        project
    }

    fn left_pad_descriptor() -> Descriptor {
        Descriptor::new(
            Ident::parse("left-pad").unwrap(),
            VersionRange::parse("^1.0.0").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_successful_upgrade() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        let advisories = vec![advisory("left-pad", "<1.3.0", ">=1.3.0")];
        let registry = FakeRegistry::new(&[("left-pad", &["1.3.1", "1.2.0"])]);
        let mut report = MemoryReport::new();

        let outcome =
            remediate(&advisories, &mut project, &registry, &mut report, true).await;

        assert_eq!(outcome.upgraded, 1);
        assert_eq!(outcome.unresolved, 0);
        assert!(!report.has_errors());

        let infos = report.infos();
        assert_eq!(infos.len(), 2);
        assert!(infos[0].starts_with("Found vulnerable left-pad@1.2.0"));
        assert!(infos[1].starts_with("Setting resolution for left-pad@^1.0.0 to left-pad@1.3.1"));

        let target = project
            .resolution_alias(left_pad_descriptor().hash())
            .unwrap();
        assert_eq!(
            project.descriptor(target).unwrap().pinned_version(),
            Some(Version::parse("1.3.1").unwrap())
        );
    }

    #[tokio::test]
    async fn test_report_line_carries_advisory_metadata() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        let mut vulnerable = advisory("left-pad", "<1.3.0", ">=1.3.0");
        vulnerable.severity = Some("high".to_string());
        vulnerable.title = Some("Regular Expression Denial of Service".to_string());
        let registry = FakeRegistry::new(&[("left-pad", &["1.3.1"])]);
        let mut report = MemoryReport::new();

        remediate(&[vulnerable], &mut project, &registry, &mut report, true).await;

        let infos = report.infos();
        assert!(infos[0].contains("[high]"));
        assert!(infos[0].contains("Regular Expression Denial of Service"));
    }

    #[tokio::test]
    async fn test_unmatched_advisory_emits_nothing() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        let advisories = vec![advisory("lodash", "<4.17.21", ">=4.17.21")];
        let registry = FakeRegistry::new(&[]);
        let mut report = MemoryReport::new();

        let outcome =
            remediate(&advisories, &mut project, &registry, &mut report, true).await;

        assert_eq!(outcome, RemediationOutcome::default());
        assert!(report.events().is_empty());
        assert_eq!(project.alias_count(), 0);
    }

    #[tokio::test]
    async fn test_no_candidates_is_an_error() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        let advisories = vec![advisory("left-pad", "<1.3.0", ">=1.3.0")];
        // registry only offers versions outside the declared range
        let registry = FakeRegistry::new(&[("left-pad", &["2.0.0"])]);
        let mut report = MemoryReport::new();

        let outcome =
            remediate(&advisories, &mut project, &registry, &mut report, true).await;

        assert_eq!(outcome.upgraded, 0);
        assert_eq!(outcome.unresolved, 1);
        assert_eq!(report.infos().len(), 1);
        assert_eq!(
            report.errors(),
            vec!["No candidates found for left-pad@^1.0.0"]
        );
        assert_eq!(project.alias_count(), 0);
        assert_eq!(project.descriptor_count(), 1);
    }

    #[tokio::test]
    async fn test_candidate_still_vulnerable_is_a_warning() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        let advisories = vec![advisory("left-pad", "<1.3.0", ">=1.3.0")];
        let registry = FakeRegistry::new(&[("left-pad", &["1.2.9", "1.2.0"])]);
        let mut report = MemoryReport::new();

        let outcome =
            remediate(&advisories, &mut project, &registry, &mut report, true).await;

        assert_eq!(outcome.upgraded, 0);
        assert_eq!(outcome.unresolved, 1);
        assert_eq!(report.infos().len(), 1);
        assert_eq!(report.warnings().len(), 1);
        assert!(report.warnings()[0]
            .starts_with("No compatible patched version found for left-pad@^1.0.0"));
        assert!(!report.has_errors());
        assert_eq!(project.alias_count(), 0);
    }

    #[tokio::test]
    async fn test_resolver_failure_is_scoped_to_the_pair() {
        let mut project = project_with(&[
            ("left-pad", "^1.0.0", "1.2.0"),
            ("lodash", "^4.0.0", "4.17.20"),
        ]);
        let advisories = vec![
            advisory("left-pad", "<1.3.0", ">=1.3.0"),
            advisory("lodash", "<4.17.21", ">=4.17.21"),
        ];
        let registry = FakeRegistry::new(&[
            ("left-pad", &["1.3.1"]),
            ("lodash", &["4.17.21"]),
        ])
        .failing_for("left-pad");
        let mut report = MemoryReport::new();

        let outcome =
            remediate(&advisories, &mut project, &registry, &mut report, true).await;

        // left-pad failed, lodash still got fixed
        assert_eq!(outcome.upgraded, 1);
        assert_eq!(outcome.unresolved, 1);
        assert_eq!(report.error_count(), 1);
        assert!(report.errors()[0].starts_with("Failed to resolve left-pad@^1.0.0"));
        assert_eq!(project.alias_count(), 1);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        let advisories = vec![advisory("left-pad", "<1.3.0", ">=1.3.0")];
        let registry = FakeRegistry::new(&[("left-pad", &["1.3.1", "1.2.0"])]);

        let mut first_report = MemoryReport::new();
        let first =
            remediate(&advisories, &mut project, &registry, &mut first_report, true).await;
        assert_eq!(first.upgraded, 1);
        let descriptors_after_first = project.descriptor_count();
        let aliases_after_first = project.alias_count();

        let mut second_report = MemoryReport::new();
        let second =
            remediate(&advisories, &mut project, &registry, &mut second_report, true).await;

        assert_eq!(second.upgraded, 0);
        assert_eq!(second.unresolved, 0);
        assert_eq!(second_report.infos().len(), 0);
        assert_eq!(project.descriptor_count(), descriptors_after_first);
        assert_eq!(project.alias_count(), aliases_after_first);
    }

    #[tokio::test]
    async fn test_overlapping_advisories_last_commit_wins() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        // The first advisory's fix (1.3.1) does not satisfy the second
        // advisory's patched range, so the second one re-commits with
        // the registry's newer offering.
        let advisories = vec![
            advisory("left-pad", "<1.3.0", ">=1.3.0"),
            advisory("left-pad", "<1.4.0", ">=1.4.0"),
        ];
        let registry = FakeRegistry::with_sequence("left-pad", &[&["1.3.1"], &["1.4.2"]]);
        let mut report = MemoryReport::new();

        let outcome =
            remediate(&advisories, &mut project, &registry, &mut report, true).await;

        assert_eq!(outcome.upgraded, 2);
        // the intermediate =1.3.1 descriptor is the engine's own
        // artifact; the second advisory must not treat it as a
        // vulnerable pair and report a failure for it
        assert_eq!(outcome.unresolved, 0);
        assert!(!report.has_errors());
        let target = project
            .resolution_alias(left_pad_descriptor().hash())
            .unwrap();
        // single alias entry, pointing at the last committed fix
        assert_eq!(project.alias_count(), 1);
        assert_eq!(
            project.descriptor(target).unwrap().pinned_version(),
            Some(Version::parse("1.4.2").unwrap())
        );
    }

    #[tokio::test]
    async fn test_overlapping_advisories_already_satisfied_skips() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        // The first fix (1.4.2 is newest) already satisfies the second
        // advisory's patched range, so the second pass mutates nothing.
        let advisories = vec![
            advisory("left-pad", "<1.4.0", ">=1.4.0"),
            advisory("left-pad", "<1.3.0", ">=1.3.0"),
        ];
        let registry = FakeRegistry::new(&[("left-pad", &["1.4.2", "1.2.0"])]);
        let mut report = MemoryReport::new();

        let outcome =
            remediate(&advisories, &mut project, &registry, &mut report, true).await;

        assert_eq!(outcome.upgraded, 1);
        assert_eq!(project.alias_count(), 1);
        // one matched advisory committed; the other was already covered
        assert_eq!(report.infos().len(), 2);
    }

    #[tokio::test]
    async fn test_phase_markers_wrap_each_matched_advisory() {
        let mut project = project_with(&[("left-pad", "^1.0.0", "1.2.0")]);
        let advisories = vec![advisory("left-pad", "<1.3.0", ">=1.3.0")];
        let registry = FakeRegistry::new(&[("left-pad", &["1.3.1"])]);
        let mut report = MemoryReport::new();

        remediate(&advisories, &mut project, &registry, &mut report, true).await;

        use crate::report::ReportEvent;
        assert!(matches!(report.events().first(), Some(ReportEvent::PhaseStart(_))));
        assert!(matches!(report.events().last(), Some(ReportEvent::PhaseEnd(_))));
    }
}
