use std::sync::LazyLock;
use std::time::Duration;

use moka::future::Cache;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::entity::{Descriptor, Ident, Locator, Package};

use super::resolver::{ResolveError, Resolver};

/// Cache TTL: 3 minutes
const CACHE_TTL: Duration = Duration::from_secs(3 * 60);

/// Global packument cache keyed by ident string
static PACKUMENT_CACHE: LazyLock<Cache<String, PackumentData>> = LazyLock::new(|| {
    Cache::builder()
        .time_to_live(CACHE_TTL)
        .max_capacity(1000)
        .build()
});

/// Characters escaped in a registry URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'%');

/// Parsed packument: published versions with their tarballs,
/// sorted newest first.
#[derive(Debug, Clone)]
struct PackumentData {
    versions: Vec<(Version, Option<String>)>,
}

#[derive(Deserialize, Debug)]
struct RawPackument {
    #[serde(default)]
    versions: BTreeMap<String, RawVersionEntry>,
}

#[derive(Deserialize, Debug)]
struct RawVersionEntry {
    #[serde(default)]
    dist: Option<RawDist>,
}

#[derive(Deserialize, Debug)]
struct RawDist {
    tarball: Option<String>,
}

/// Get the registry URL path for an ident (`@scope/name` becomes
/// `@scope%2fname`).
fn packument_path(ident: &Ident) -> String {
    let name = utf8_percent_encode(&ident.name, PATH_SEGMENT);
    match &ident.scope {
        Some(scope) => format!("@{}%2f{}", utf8_percent_encode(scope, PATH_SEGMENT), name),
        None => name.to_string(),
    }
}

/// Candidate resolver backed by an npm registry.
#[derive(Debug, Clone)]
pub struct NpmRegistryResolver {
    http_client: reqwest::Client,
    registry_url: String,
}

impl Default for NpmRegistryResolver {
    fn default() -> Self {
        Self::new("https://registry.npmjs.org")
    }
}

impl NpmRegistryResolver {
    pub fn new(registry_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            registry_url: registry_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch and parse the packument, using cache if available.
    async fn packument(&self, ident: &Ident) -> Result<PackumentData, ResolveError> {
        let cache_key = ident.to_string();

        if let Some(cached) = PACKUMENT_CACHE.get(&cache_key).await {
            debug!("cache hit for '{}'", cache_key);
            return Ok(cached);
        }

        debug!("cache miss for '{}', fetching from registry", cache_key);

        let url = format!("{}/{}", self.registry_url, packument_path(ident));
        let resp = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::RequestFailed(cache_key.clone(), e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound(cache_key));
        }
        if !resp.status().is_success() {
            return Err(ResolveError::BadStatus(cache_key, resp.status().as_u16()));
        }

        let raw: RawPackument = resp
            .json()
            .await
            .map_err(|e| ResolveError::MalformedMetadata(cache_key.clone(), e.to_string()))?;

        let mut versions: Vec<(Version, Option<String>)> = raw
            .versions
            .into_iter()
            .filter_map(|(version_str, entry)| {
                match Version::parse(&version_str) {
                    Ok(version) => Some((version, entry.dist.and_then(|d| d.tarball))),
                    Err(e) => {
                        debug!("skipping unparsable version '{}': {}", version_str, e);
                        None
                    }
                }
            })
            .collect();
        // Newest first: this is the preference order candidates() exposes
        versions.sort_by(|a, b| b.0.cmp(&a.0));

        debug!("parsed {} versions for '{}'", versions.len(), cache_key);

        let data = PackumentData { versions };
        PACKUMENT_CACHE.insert(cache_key, data.clone()).await;
        Ok(data)
    }
}

impl Resolver for NpmRegistryResolver {
    async fn candidates(&self, descriptor: &Descriptor) -> Result<Vec<Locator>, ResolveError> {
        let packument = self.packument(descriptor.ident()).await?;
        Ok(packument
            .versions
            .into_iter()
            .filter(|(version, _)| descriptor.range().satisfies(version))
            .map(|(version, _)| Locator::new(descriptor.ident().clone(), version))
            .collect())
    }

    async fn resolve(&self, locator: &Locator) -> Result<Package, ResolveError> {
        let packument = self.packument(locator.ident()).await?;
        let tarball = packument
            .versions
            .into_iter()
            .find(|(version, _)| version == locator.version())
            .ok_or_else(|| {
                ResolveError::VersionNotFound(
                    locator.version().to_string(),
                    locator.ident().to_string(),
                )
            })?
            .1;

        let mut package = Package::new(locator.ident().clone(), locator.version().clone());
        package.dist_tarball = tarball;
        Ok(package)
    }
}
