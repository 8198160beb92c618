//! Per-dependency license resolution.
//!
//! # Flow
//! 1. Installed gemspec ([`LocalSource`]).
//! 2. RubyGems API ([`RegistrySource`]).
//! 3. Neither has a license: [`LicenseSource::Unknown`].
//! 4. Descriptive labels from step 1 or 2 are rewritten to the SPDX id
//!    GitHub detects for the gem's repository ([`RepositoryLicenseSource`]).
//!
//! No step can fail the lookup; every failure degrades to the next step.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::debug;

use crate::license::matcher::{fingerprint, looks_canonical};
use crate::models::{Dependency, LicenseInfo, LicenseSource};
use crate::registry::gemspec::{self, GemspecDirectory};
use crate::registry::github::{self, GithubClient};
use crate::registry::rubygems::{self, RubyGemsClient};
use crate::registry::{
    dedup_preserving_order, http_client, DetectedLicense, GithubRepo, LocalSource, PackageMetadata,
    RegistrySource, RepositoryLicenseSource,
};

const DEFAULT_CONCURRENCY: usize = 8;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the fetcher needs from its environment, passed in explicitly.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub registry_url: String,
    pub github_api_url: String,
    pub user_agent: String,
    /// Bearer token for the GitHub API; raises its rate limit.
    pub github_token: Option<String>,
    /// Gem directories holding `specifications/`.
    pub gem_paths: Vec<PathBuf>,
    /// Dependencies fetched at once by [`LicenseFetcher::fetch_all`].
    pub concurrency: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            registry_url: rubygems::DEFAULT_REGISTRY_URL.to_string(),
            github_api_url: github::DEFAULT_API_URL.to_string(),
            user_agent: format!("gem-license-checkr/{}", env!("CARGO_PKG_VERSION")),
            github_token: None,
            gem_paths: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout: REQUEST_TIMEOUT,
            read_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl FetcherConfig {
    /// Defaults plus `GITHUB_TOKEN` and the gem directories visible from `project_dir`.
    pub fn from_env(project_dir: &Path) -> Self {
        let mut config = Self::default();

        config.github_token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        config.gem_paths = gem_search_path(
            project_dir,
            std::env::var_os("BUNDLE_PATH").map(PathBuf::from),
            std::env::var_os("GEM_HOME"),
            std::env::var_os("GEM_PATH"),
            dirs::home_dir().as_deref(),
        );
        debug!(gem_paths = ?config.gem_paths, "gem search path");

        config
    }
}

/// Gem directories in lookup order: the project's Bundler install, then
/// `GEM_HOME` and `GEM_PATH`. RubyGems' per-user and system directories are
/// only added when neither variable is set.
fn gem_search_path(
    project_dir: &Path,
    bundle_path: Option<PathBuf>,
    gem_home: Option<OsString>,
    gem_path: Option<OsString>,
    home: Option<&Path>,
) -> Vec<PathBuf> {
    let mut gem_paths = gemspec::bundle_gem_paths(project_dir, bundle_path);

    let mut from_env: Vec<PathBuf> = Vec::new();
    if let Some(gem_home) = gem_home {
        from_env.push(PathBuf::from(gem_home));
    }
    if let Some(paths) = gem_path {
        from_env.extend(std::env::split_paths(&paths));
    }
    from_env.retain(|p| !p.as_os_str().is_empty());

    if from_env.is_empty() {
        gem_paths.extend(gemspec::default_gem_paths(home));
    } else {
        gem_paths.extend(from_env);
    }

    let mut seen = HashSet::new();
    gem_paths.retain(|p| seen.insert(p.clone()));
    gem_paths
}

/// Resolves [`LicenseInfo`] for dependencies through an ordered chain of sources.
pub struct LicenseFetcher {
    local: Box<dyn LocalSource>,
    registry: Box<dyn RegistrySource>,
    repository: Box<dyn RepositoryLicenseSource>,
    concurrency: usize,
}

impl LicenseFetcher {
    /// Build a fetcher backed by installed gemspecs, RubyGems.org and GitHub.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = http_client(config.connect_timeout, config.read_timeout)?;

        let fetcher = Self::with_sources(
            Box::new(GemspecDirectory::new(config.gem_paths.clone())),
            Box::new(RubyGemsClient::new(
                client.clone(),
                config.registry_url.clone(),
                config.user_agent.clone(),
            )),
            Box::new(GithubClient::new(
                client,
                config.github_api_url.clone(),
                config.user_agent.clone(),
                config.github_token.clone(),
            )),
        )
        .with_concurrency(config.concurrency);

        Ok(fetcher)
    }

    pub fn with_sources(
        local: Box<dyn LocalSource>,
        registry: Box<dyn RegistrySource>,
        repository: Box<dyn RepositoryLicenseSource>,
    ) -> Self {
        Self {
            local,
            registry,
            repository,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Resolve one dependency. Never fails; unresolvable gems come back
    /// with no licenses and [`LicenseSource::Unknown`].
    pub async fn fetch(&self, name: &str, version: &str) -> LicenseInfo {
        let Some((source, metadata)) = self.lookup(name, version).await else {
            debug!(gem = name, version, "no source declared a license");
            return LicenseInfo::unknown(name, version);
        };

        let licenses = self.canonicalize(name, &metadata).await;
        let homepage = metadata.homepage.or(metadata.source_code_uri);

        LicenseInfo {
            name: name.to_string(),
            version: version.to_string(),
            licenses,
            source,
            homepage,
        }
    }

    /// Resolve every dependency, returning results in input order.
    pub async fn fetch_all(&self, dependencies: &[Dependency]) -> Vec<LicenseInfo> {
        self.fetch_all_with_progress(dependencies, None).await
    }

    /// [`fetch_all`](Self::fetch_all), advancing `progress` once per dependency.
    pub async fn fetch_all_with_progress(
        &self,
        dependencies: &[Dependency],
        progress: Option<&ProgressBar>,
    ) -> Vec<LicenseInfo> {
        // `buffered` keeps output order equal to input order.
        stream::iter(dependencies)
            .map(|dep| async move {
                let info = self.fetch(&dep.name, &dep.version).await;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                info
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// First source with at least one license wins.
    async fn lookup(&self, name: &str, version: &str) -> Option<(LicenseSource, PackageMetadata)> {
        if let Some(metadata) = self.local.lookup(name, version) {
            debug!(gem = name, "license from installed gemspec");
            return Some((LicenseSource::Local, metadata));
        }

        if let Some(metadata) = self.registry.lookup(name).await {
            debug!(gem = name, "license from registry");
            return Some((LicenseSource::RemoteApi, metadata));
        }

        None
    }

    /// Rewrite descriptive labels to the repository's detected SPDX id.
    async fn canonicalize(&self, name: &str, metadata: &PackageMetadata) -> Vec<String> {
        let labels = metadata.licenses.clone();

        if labels.iter().all(|l| looks_canonical(l)) {
            return labels;
        }

        let Some(repo) = repository_for(metadata) else {
            debug!(gem = name, "descriptive license label but no GitHub repository");
            return labels;
        };

        match self.repository.detect(&repo).await {
            Some(detected) => {
                debug!(gem = name, spdx_id = %detected.spdx_id, "canonicalizing license labels");
                canonicalize_labels(labels, &detected)
            }
            None => labels,
        }
    }
}

/// GitHub repository from `source_code_uri`, else from the homepage.
fn repository_for(metadata: &PackageMetadata) -> Option<GithubRepo> {
    [&metadata.source_code_uri, &metadata.homepage]
        .into_iter()
        .flatten()
        .find_map(|url| GithubRepo::from_url(url))
}

/// Replace every label fingerprint-equal to the detected license with its SPDX id.
fn canonicalize_labels(labels: Vec<String>, detected: &DetectedLicense) -> Vec<String> {
    let known: Vec<String> = [
        Some(detected.spdx_id.as_str()),
        detected.name.as_deref(),
        detected.key.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter_map(fingerprint)
    .collect();

    if known.is_empty() {
        return labels;
    }

    let rewritten = labels.into_iter().map(|label| match fingerprint(&label) {
        Some(fp) if known.contains(&fp) => detected.spdx_id.clone(),
        _ => label,
    });

    dedup_preserving_order(rewritten)
}
