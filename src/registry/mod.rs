//! License data sources consulted by the [`LicenseFetcher`](crate::fetcher::LicenseFetcher).
//!
//! - [`gemspec`] — gem specifications installed on this machine.
//! - [`rubygems`] — the RubyGems.org JSON API.
//! - [`github`] — GitHub's repository license detection, used only to
//!   canonicalize descriptive labels.
//!
//! Every source answers `Option`: a missing gem, a non-2xx status, a
//! malformed body or a transport error all mean "no data here" and are
//! logged, never returned as errors.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

pub mod gemspec;
pub mod github;
pub mod rubygems;

pub use github::{DetectedLicense, GithubRepo};

/// License-relevant metadata shared by all package sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub licenses: Vec<String>,
    pub homepage: Option<String>,
    pub source_code_uri: Option<String>,
}

/// Gems installed locally.
pub trait LocalSource: Send + Sync {
    fn lookup(&self, name: &str, version: &str) -> Option<PackageMetadata>;
}

/// A remote package registry.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn lookup(&self, name: &str) -> Option<PackageMetadata>;
}

/// A source-hosting platform that can detect a repository's license.
#[async_trait]
pub trait RepositoryLicenseSource: Send + Sync {
    async fn detect(&self, repo: &GithubRepo) -> Option<DetectedLicense>;
}

/// Merge a list field and a singular field into trimmed, non-empty, unique labels.
pub fn collect_licenses<I, S>(list: I, single: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let labels = list
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .chain(single.map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());

    dedup_preserving_order(labels)
}

/// Remove repeated entries, keeping the first occurrence of each.
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Build the HTTP client shared by the remote sources.
pub fn http_client(connect_timeout: Duration, read_timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()?;
    Ok(client)
}
