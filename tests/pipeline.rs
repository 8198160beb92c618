use std::collections::HashMap;
use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use gem_license_checkr::checker;
use gem_license_checkr::config::{parse_policy, Policy};
use gem_license_checkr::fetcher::LicenseFetcher;
use gem_license_checkr::models::LicenseSource;
use gem_license_checkr::registry::{
    DetectedLicense, GithubRepo, LocalSource, PackageMetadata, RegistrySource,
    RepositoryLicenseSource,
};
use gem_license_checkr::report::{render_check, ReportFormat};
use gem_license_checkr::resolver;

const LOCKFILE: &str = "GEM
  remote: https://rubygems.org/
  specs:
    dependency-one (1.0.0)
    dependency-two (1.1.0)
      dependency-three (~> 0.3)
    dependency-three (0.3.2)

PLATFORMS
  ruby

DEPENDENCIES
  bundler
  dependency-one
  dependency-two (~> 1.1)

BUNDLED WITH
   2.5.3
";

struct Installed;

impl LocalSource for Installed {
    fn lookup(&self, name: &str, _version: &str) -> Option<PackageMetadata> {
        (name == "dependency-three").then(|| PackageMetadata {
            licenses: vec!["GPL-3.0".to_string()],
            homepage: None,
            source_code_uri: None,
        })
    }
}

struct Registry(HashMap<&'static str, PackageMetadata>);

#[async_trait]
impl RegistrySource for Registry {
    async fn lookup(&self, name: &str) -> Option<PackageMetadata> {
        self.0.get(name).cloned()
    }
}

struct Github;

#[async_trait]
impl RepositoryLicenseSource for Github {
    async fn detect(&self, repo: &GithubRepo) -> Option<DetectedLicense> {
        (repo.owner == "example" && repo.repo == "dependency-one").then(|| DetectedLicense {
            spdx_id: "BSD-2-Clause".to_string(),
            name: Some("BSD 2-Clause \"Simplified\" License".to_string()),
            key: Some("bsd-2-clause".to_string()),
        })
    }
}

fn fetcher() -> LicenseFetcher {
    let registry = Registry(HashMap::from([
        (
            "dependency-one",
            PackageMetadata {
                licenses: vec!["BSD 2-Clause".to_string()],
                homepage: Some("https://github.com/example/dependency-one".to_string()),
                source_code_uri: None,
            },
        ),
        (
            "dependency-two",
            PackageMetadata {
                licenses: vec!["Apache License, Version 2.0".to_string()],
                homepage: Some("https://packages.example/dependency-two".to_string()),
                source_code_uri: None,
            },
        ),
    ]));

    LicenseFetcher::with_sources(Box::new(Installed), Box::new(registry), Box::new(Github))
}

fn lockfile() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(LOCKFILE.as_bytes()).unwrap();
    file
}

fn policy() -> Policy {
    parse_policy(
        r#"
allowed_licenses = ["BSD-2-Clause", "Apache-2.0"]
ignored_gems = []
deny_unknown = true
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_direct_dependencies_pass() {
    let file = lockfile();
    let deps = resolver::resolve(file.path(), false).unwrap();
    let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["dependency-one", "dependency-two"]);

    let infos = fetcher().fetch_all(&deps).await;
    assert_eq!(infos[0].licenses, vec!["BSD-2-Clause".to_string()]);
    assert_eq!(infos[1].licenses, vec!["Apache License, Version 2.0".to_string()]);
    assert!(infos.iter().all(|i| i.source == LicenseSource::RemoteApi));

    let result = checker::check(&policy(), &infos);
    assert_eq!(result.passed.len(), 2);
    assert!(!result.has_violations());
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn test_recursive_check_reports_transitive_violation() {
    let file = lockfile();
    let deps = resolver::resolve(file.path(), true).unwrap();
    assert_eq!(deps.len(), 3);

    let infos = fetcher().fetch_all(&deps).await;
    let three = infos.iter().find(|i| i.name == "dependency-three").unwrap();
    assert_eq!(three.source, LicenseSource::Local);

    let result = checker::check(&policy(), &infos);
    assert_eq!(result.total(), infos.len());
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].info.name, "dependency-three");
    assert_eq!(
        result.violations[0].reason,
        "License 'GPL-3.0' is not in the allowed list"
    );

    let json = render_check(ReportFormat::Json, &result).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["summary"]["violations"], 1);
}

#[tokio::test]
async fn test_ignored_gems_leave_every_bucket() {
    let file = lockfile();
    let deps = resolver::resolve(file.path(), true).unwrap();
    let infos = fetcher().fetch_all(&deps).await;

    let policy = Policy {
        ignored_gems: vec!["dependency-three".to_string()],
        ..policy()
    };
    let result = checker::check(&policy, &infos);

    assert_eq!(result.total(), 2);
    assert!(!result.has_violations());
}
