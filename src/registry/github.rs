use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::RepositoryLicenseSource;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const GITHUB_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// `owner/repo` coordinates of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub owner: String,
    pub repo: String,
}

impl GithubRepo {
    /// Extract the repository from a GitHub URL.
    ///
    /// Takes the first two non-empty path segments and strips a trailing
    /// `.git`; anything that is not an absolute `github.com` URL gives `None`.
    pub fn from_url(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let url = Url::parse(raw).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        if !GITHUB_HOSTS.contains(&host.as_str()) {
            return None;
        }

        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let repo = segments.next()?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        if owner.is_empty() || repo.is_empty() {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

/// The license GitHub detected for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedLicense {
    pub spdx_id: String,
    pub name: Option<String>,
    pub key: Option<String>,
}

/// Client for `GET {api}/repos/{owner}/{repo}/license`.
pub struct GithubClient {
    client: Client,
    api_url: String,
    user_agent: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        user_agent: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Fetch the detected license; `Ok(None)` when GitHub has no usable SPDX id.
    pub async fn fetch_license(&self, repo: &GithubRepo) -> Result<Option<DetectedLicense>> {
        let url = format!(
            "{}/repos/{}/{}/license",
            self.api_url, repo.owner, repo.repo
        );

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", self.user_agent.as_str());

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            debug!(
                owner = %repo.owner,
                repo = %repo.repo,
                status = %response.status(),
                "no license detection available"
            );
            return Ok(None);
        }

        let data: Value = response.json().await?;
        Ok(detected_from_payload(&data))
    }
}

#[async_trait]
impl RepositoryLicenseSource for GithubClient {
    async fn detect(&self, repo: &GithubRepo) -> Option<DetectedLicense> {
        match self.fetch_license(repo).await {
            Ok(detected) => detected,
            Err(e) => {
                warn!(owner = %repo.owner, repo = %repo.repo, error = %e, "license detection failed");
                None
            }
        }
    }
}

fn detected_from_payload(data: &Value) -> Option<DetectedLicense> {
    let license = data.get("license")?.as_object()?;

    let spdx_id = license.get("spdx_id")?.as_str()?.trim();
    if spdx_id.is_empty() || spdx_id == "NOASSERTION" {
        return None;
    }

    let text = |key: &str| license.get(key).and_then(|v| v.as_str()).map(str::to_string);

    Some(DetectedLicense {
        spdx_id: spdx_id.to_string(),
        name: text("name"),
        key: text("key"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_server::serve_once;
    use std::time::Duration;

    fn client() -> Client {
        crate::registry::http_client(Duration::from_secs(5), Duration::from_secs(5)).unwrap()
    }

    fn repo(owner: &str, name: &str) -> GithubRepo {
        GithubRepo {
            owner: owner.to_string(),
            repo: name.to_string(),
        }
    }

    #[test]
    fn test_repo_from_url() {
        assert_eq!(
            GithubRepo::from_url("https://github.com/rack/rack"),
            Some(repo("rack", "rack"))
        );
        assert_eq!(
            GithubRepo::from_url("https://www.GitHub.com/rails/rails.git"),
            Some(repo("rails", "rails"))
        );
        assert_eq!(
            GithubRepo::from_url("https://github.com/owner/repo/tree/main/lib"),
            Some(repo("owner", "repo"))
        );
        assert_eq!(
            GithubRepo::from_url("http://github.com//owner//repo/"),
            Some(repo("owner", "repo"))
        );
    }

    #[test]
    fn test_repo_from_url_rejects_non_github() {
        assert_eq!(GithubRepo::from_url("https://gitlab.com/owner/repo"), None);
        assert_eq!(GithubRepo::from_url("https://github.com/owner"), None);
        assert_eq!(GithubRepo::from_url("https://github.com/owner/.git"), None);
        assert_eq!(GithubRepo::from_url("github.com/owner/repo"), None);
        assert_eq!(GithubRepo::from_url("   "), None);
    }

    #[test]
    fn test_payload_noassertion_is_none() {
        let data = serde_json::json!({
            "license": { "spdx_id": "NOASSERTION", "name": "Other", "key": "other" }
        });
        assert!(detected_from_payload(&data).is_none());
        assert!(detected_from_payload(&serde_json::json!({ "license": null })).is_none());
        assert!(detected_from_payload(&serde_json::json!({ "message": "Not Found" })).is_none());
    }

    #[tokio::test]
    async fn test_fetch_sends_github_headers() {
        let (base, request) = serve_once(
            200,
            r#"{"license":{"key":"bsd-2-clause","name":"BSD 2-Clause \"Simplified\" License","spdx_id":"BSD-2-Clause"}}"#,
        )
        .await;
        let github = GithubClient::new(
            client(),
            base,
            "gem-license-checkr/test",
            Some("secret-token".to_string()),
        );

        let detected = github.detect(&repo("example", "dependency-one")).await.unwrap();
        assert_eq!(detected.spdx_id, "BSD-2-Clause");
        assert_eq!(detected.key.as_deref(), Some("bsd-2-clause"));

        let request = request.await.unwrap();
        assert!(request.starts_with("get /repos/example/dependency-one/license"));
        assert!(request.contains("accept: application/vnd.github+json"));
        assert!(request.contains("x-github-api-version: 2022-11-28"));
        assert!(request.contains("user-agent: gem-license-checkr/test"));
        assert!(request.contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn test_fetch_without_token_omits_authorization() {
        let (base, request) = serve_once(404, "").await;
        let github = GithubClient::new(client(), base, "gem-license-checkr/test", Some(String::new()));

        assert!(github.detect(&repo("example", "missing")).await.is_none());

        let request = request.await.unwrap();
        assert!(!request.contains("authorization:"));
    }
}
