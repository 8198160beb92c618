use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::models::{CheckResult, Finding, LicenseInfo};

#[derive(Serialize)]
struct ListReport<'a> {
    generated_at: String,
    gems: &'a [LicenseInfo],
}

#[derive(Serialize)]
struct CheckReport<'a> {
    generated_at: String,
    summary: Summary,
    violations: &'a [Finding],
    warnings: &'a [Finding],
    passed: &'a [LicenseInfo],
}

#[derive(Serialize)]
struct Summary {
    total: usize,
    passed: usize,
    violations: usize,
    warnings: usize,
}

pub fn render_list(infos: &[LicenseInfo]) -> Result<String> {
    let report = ListReport {
        generated_at: timestamp(),
        gems: infos,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn render_check(result: &CheckResult) -> Result<String> {
    let report = CheckReport {
        generated_at: timestamp(),
        summary: Summary {
            total: result.total(),
            passed: result.passed.len(),
            violations: result.violations.len(),
            warnings: result.warnings.len(),
        },
        violations: &result.violations,
        warnings: &result.warnings,
        passed: &result.passed,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
