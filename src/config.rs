use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// File name looked up in the project directory.
pub const PROJECT_CONFIG_FILE: &str = ".gem-license-checkr.toml";

const VALID_KEYS: [&str; 4] = [
    "allowed_licenses",
    "ignored_gems",
    "deny_unknown",
    "license_match",
];

/// Written by `gem-license-checkr init`.
pub const SAMPLE_CONFIG: &str = r#"# .gem-license-checkr.toml
allowed_licenses = [
  "MIT",
  "Apache-2.0",
  "BSD-2-Clause",
  "BSD-3-Clause",
  "ISC",
  "Ruby",
]

ignored_gems = ["bundler", "rake"]

# Report gems without a declared license as warnings
deny_unknown = true

# "any": one allowed license is enough (dual-licensed gems pass)
# "all": every declared license must be allowed
license_match = "any"
"#;

/// License policy, deserialized from `.gem-license-checkr.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Allowed license labels. Empty means every license is allowed.
    pub allowed_licenses: Vec<String>,
    /// Gems left out of the check entirely.
    pub ignored_gems: Vec<String>,
    /// Warn about gems that declare no license.
    pub deny_unknown: bool,
    /// How a multi-license gem is judged.
    pub license_match: MatchMode,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            allowed_licenses: Vec::new(),
            ignored_gems: Vec::new(),
            deny_unknown: true,
            license_match: MatchMode::Any,
        }
    }
}

/// Whether one or all of a gem's licenses must be allowed.
///
/// `Any` treats a license list as a choice offered by the author (dual
/// licensing); `All` treats it as a set of obligations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

/// Load the policy, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.gem-license-checkr.toml`
/// 3. `~/.config/gem-license-checkr/config.toml`
///
/// A policy is required; finding none is an error.
pub fn load_policy(project_path: &Path, config_override: Option<&Path>) -> Result<Policy> {
    if let Some(path) = config_override {
        return load_policy_file(path);
    }

    let home_config = dirs::home_dir().map(|home| {
        home.join(".config")
            .join("gem-license-checkr")
            .join("config.toml")
    });

    match discover(project_path, home_config) {
        Some(path) => load_policy_file(&path),
        None => Err(Error::ConfigNotFound(project_path.join(PROJECT_CONFIG_FILE))),
    }
}

fn discover(project_path: &Path, home_config: Option<PathBuf>) -> Option<PathBuf> {
    let project_config = project_path.join(PROJECT_CONFIG_FILE);
    if project_config.is_file() {
        return Some(project_config);
    }

    home_config.filter(|p| p.is_file())
}

/// Read and validate a single policy file.
pub fn load_policy_file(path: &Path) -> Result<Policy> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "loading policy");
    parse_policy(&content).map_err(|message| Error::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse policy TOML, warning about keys this tool does not know.
pub fn parse_policy(content: &str) -> std::result::Result<Policy, String> {
    let table: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;

    for key in unknown_keys(&table) {
        warn!("Unknown configuration key '{}'", key);
    }

    toml::from_str(content).map_err(|e| e.to_string())
}

fn unknown_keys(table: &toml::Table) -> Vec<&str> {
    table
        .keys()
        .map(String::as_str)
        .filter(|key| !VALID_KEYS.contains(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_policy() {
        let policy = parse_policy(
            r#"
allowed_licenses = ["MIT"]
ignored_gems = ["bundler"]
deny_unknown = false
license_match = "all"
"#,
        )
        .unwrap();

        assert_eq!(policy.allowed_licenses, vec!["MIT".to_string()]);
        assert_eq!(policy.ignored_gems, vec!["bundler".to_string()]);
        assert!(!policy.deny_unknown);
        assert_eq!(policy.license_match, MatchMode::All);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        assert_eq!(parse_policy("").unwrap(), Policy::default());
        let policy = Policy::default();
        assert!(policy.allowed_licenses.is_empty());
        assert!(policy.ignored_gems.is_empty());
        assert!(policy.deny_unknown);
        assert_eq!(policy.license_match, MatchMode::Any);
    }

    #[test]
    fn test_sample_config_parses() {
        let policy = parse_policy(SAMPLE_CONFIG).unwrap();
        assert!(policy.allowed_licenses.contains(&"Ruby".to_string()));
        assert_eq!(policy.ignored_gems, vec!["bundler".to_string(), "rake".to_string()]);
        assert!(policy.deny_unknown);
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        let content = "allowed_licenses = []\nextra_key = \"value\"\n";
        let table: toml::Table = toml::from_str(content).unwrap();
        assert_eq!(unknown_keys(&table), vec!["extra_key"]);
        assert!(parse_policy(content).is_ok());
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        assert!(parse_policy("allowed_licenses = \"MIT\"").is_err());
        assert!(parse_policy("ignored_gems = \"bundler\"").is_err());
        assert!(parse_policy("deny_unknown = \"yes\"").is_err());
        assert!(parse_policy("license_match = \"some\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_policy_file(Path::new("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.toml");
        std::fs::write(&path, "allowed_licenses = [").unwrap();

        let err = load_policy_file(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_discover_prefers_project_file() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let home_config = home.path().join("config.toml");
        std::fs::write(&home_config, "deny_unknown = false\n").unwrap();

        assert_eq!(
            discover(project.path(), Some(home_config.clone())),
            Some(home_config.clone())
        );

        let project_config = project.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&project_config, SAMPLE_CONFIG).unwrap();
        assert_eq!(
            discover(project.path(), Some(home_config)),
            Some(project_config)
        );
    }

    #[test]
    fn test_override_must_exist() {
        let project = TempDir::new().unwrap();
        let err = load_policy(project.path(), Some(&project.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}
