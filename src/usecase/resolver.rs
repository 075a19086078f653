use thiserror::Error;

use crate::entity::{Descriptor, Locator, Package};

/// Errors from candidate resolution.
///
/// These are always scoped to the descriptor being processed: the
/// engine reports them and moves on to the next matched pair.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("package `{0}` not found in the registry")]
    NotFound(String),

    #[error("version `{0}` of `{1}` is not published")]
    VersionNotFound(String, String),

    #[error("registry request for `{0}` failed: {1}")]
    RequestFailed(String, String),

    #[error("registry returned {1} for `{0}`")]
    BadStatus(String, u16),

    #[error("malformed registry metadata for `{0}`: {1}")]
    MalformedMetadata(String, String),
}

/// The candidate resolver contract.
///
/// Both operations may suspend on network or filesystem I/O. The
/// candidate ordering is the resolver's own preference order; callers
/// take the first entry and never re-sort.
pub trait Resolver {
    /// Propose concrete locators for a descriptor, best first.
    fn candidates(
        &self,
        descriptor: &Descriptor,
    ) -> impl std::future::Future<Output = Result<Vec<Locator>, ResolveError>> + Send;

    /// Materialize the full package record for a chosen candidate.
    fn resolve(
        &self,
        locator: &Locator,
    ) -> impl std::future::Future<Output = Result<Package, ResolveError>> + Send;
}
