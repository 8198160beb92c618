use crate::config::{MatchMode, Policy};
use crate::license::matcher::matches;
use crate::models::{CheckOutcome, CheckResult, Finding, LicenseInfo};

pub const UNKNOWN_LICENSE_REASON: &str = "License not specified";

/// Check every dependency against `policy`. Pure; order within each bucket
/// follows `infos`.
pub fn check(policy: &Policy, infos: &[LicenseInfo]) -> CheckResult {
    let mut result = CheckResult::default();

    for info in infos {
        if let Some(outcome) = evaluate(policy, info) {
            result.push(outcome);
        }
    }

    result
}

/// Verdict for a single dependency; `None` when the gem is ignored.
pub fn evaluate(policy: &Policy, info: &LicenseInfo) -> Option<CheckOutcome> {
    if policy.ignored_gems.iter().any(|name| name == &info.name) {
        return None;
    }

    if info.licenses.is_empty() {
        let outcome = if policy.deny_unknown {
            CheckOutcome::Warning(Finding::new(info.clone(), UNKNOWN_LICENSE_REASON))
        } else {
            CheckOutcome::Passed(info.clone())
        };
        return Some(outcome);
    }

    // No allow-list means no restriction.
    if policy.allowed_licenses.is_empty() {
        return Some(CheckOutcome::Passed(info.clone()));
    }

    let is_allowed = |label: &String| {
        policy
            .allowed_licenses
            .iter()
            .any(|allowed| matches(label, allowed))
    };

    let outcome = match policy.license_match {
        MatchMode::Any => {
            if info.licenses.iter().any(is_allowed) {
                CheckOutcome::Passed(info.clone())
            } else {
                let reason = format!(
                    "License '{}' is not in the allowed list",
                    info.licenses.join(", ")
                );
                CheckOutcome::Violation(Finding::new(info.clone(), reason))
            }
        }
        MatchMode::All => {
            let disallowed: Vec<&str> = info
                .licenses
                .iter()
                .filter(|label| !is_allowed(*label))
                .map(String::as_str)
                .collect();

            if disallowed.is_empty() {
                CheckOutcome::Passed(info.clone())
            } else {
                let reason = format!(
                    "Licenses '{}' are not in the allowed list",
                    disallowed.join(", ")
                );
                CheckOutcome::Violation(Finding::new(info.clone(), reason))
            }
        }
    };

    Some(outcome)
}
