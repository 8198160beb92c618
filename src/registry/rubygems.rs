use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{collect_licenses, PackageMetadata, RegistrySource};

pub const DEFAULT_REGISTRY_URL: &str = "https://rubygems.org";

/// Client for `GET {registry}/api/v1/gems/{name}.json`.
pub struct RubyGemsClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl RubyGemsClient {
    pub fn new(client: Client, base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    /// Fetch a gem's license metadata.
    ///
    /// `Ok(None)` when the gem is unknown or declares no license.
    pub async fn fetch_metadata(&self, name: &str) -> Result<Option<PackageMetadata>> {
        let url = format!("{}/api/v1/gems/{}.json", self.base_url, name);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", self.user_agent.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(gem = name, status = %response.status(), "registry returned no data");
            return Ok(None);
        }

        let data: Value = response.json().await?;
        Ok(metadata_from_payload(&data))
    }
}

#[async_trait]
impl RegistrySource for RubyGemsClient {
    async fn lookup(&self, name: &str) -> Option<PackageMetadata> {
        match self.fetch_metadata(name).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(gem = name, error = %e, "registry lookup failed");
                None
            }
        }
    }
}

fn metadata_from_payload(data: &Value) -> Option<PackageMetadata> {
    let list: Vec<&str> = data
        .get("licenses")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|i| i.as_str()).collect())
        .unwrap_or_default();
    let single = data.get("license").and_then(|v| v.as_str());

    let licenses = collect_licenses(list, single);
    if licenses.is_empty() {
        return None;
    }

    let string_field = |key: &str| {
        data.get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(PackageMetadata {
        licenses,
        homepage: string_field("homepage_uri").or_else(|| string_field("homepage")),
        source_code_uri: string_field("source_code_uri"),
    })
}
