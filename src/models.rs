use serde::{Deserialize, Serialize};

/// A locked gem resolved from `Gemfile.lock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Resolved license data for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub name: String,
    pub version: String,
    pub licenses: Vec<String>,
    pub source: LicenseSource,
    pub homepage: Option<String>,
}

impl LicenseInfo {
    /// An info for a dependency no source could describe.
    pub fn unknown(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            licenses: Vec::new(),
            source: LicenseSource::Unknown,
            homepage: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseSource {
    /// Installed gemspec on this machine.
    Local,
    /// RubyGems registry API.
    #[serde(rename = "api")]
    RemoteApi,
    Unknown,
}

impl std::fmt::Display for LicenseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseSource::Local => write!(f, "local"),
            LicenseSource::RemoteApi => write!(f, "api"),
            LicenseSource::Unknown => write!(f, "unknown"),
        }
    }
}

/// A violation or warning raised against a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub info: LicenseInfo,
    pub reason: String,
}

impl Finding {
    pub fn new(info: LicenseInfo, reason: impl Into<String>) -> Self {
        Self {
            info,
            reason: reason.into(),
        }
    }
}

/// Verdict for a single, non-ignored dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed(LicenseInfo),
    Violation(Finding),
    Warning(Finding),
}

/// Aggregate of all outcomes for one check run, each bucket in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub passed: Vec<LicenseInfo>,
    pub violations: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl CheckResult {
    pub fn push(&mut self, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::Passed(info) => self.passed.push(info),
            CheckOutcome::Violation(finding) => self.violations.push(finding),
            CheckOutcome::Warning(finding) => self.warnings.push(finding),
        }
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.violations.len() + self.warnings.len()
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}
