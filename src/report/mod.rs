//! Report renderers for dependency lists and check results.
//!
//! - [`table`] — `comfy-table` output for terminals.
//! - [`csv`] — one row per dependency, quoted where needed.
//! - [`json`] — pretty-printed document with a summary block.
//! - [`markdown`] — GitHub-flavoured tables.
//!
//! Renderers return the report as a `String`; writing it is up to the caller.

use anyhow::Result;

use crate::models::{CheckResult, Finding, LicenseInfo};

pub mod csv;
pub mod json;
pub mod markdown;
pub mod table;

pub const LIST_HEADERS: [&str; 5] = ["Gem", "Version", "License", "Source", "Homepage"];
pub const CHECK_HEADERS: [&str; 5] = ["Gem", "Version", "License", "Source", "Reason"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Table,
    Csv,
    Json,
    Markdown,
}

/// Render the output of `list`.
pub fn render_list(format: ReportFormat, infos: &[LicenseInfo]) -> Result<String> {
    let report = match format {
        ReportFormat::Table => table::render_list(infos),
        ReportFormat::Csv => csv::render_list(infos),
        ReportFormat::Json => json::render_list(infos)?,
        ReportFormat::Markdown => markdown::render_list(infos),
    };
    Ok(terminated(report))
}

/// Render the output of `check`.
pub fn render_check(format: ReportFormat, result: &CheckResult) -> Result<String> {
    let report = match format {
        ReportFormat::Table => table::render_check(result),
        ReportFormat::Csv => csv::render_check(result),
        ReportFormat::Json => json::render_check(result)?,
        ReportFormat::Markdown => markdown::render_check(result),
    };
    Ok(terminated(report))
}

/// Reports always end with a newline, whether printed or written to a file.
fn terminated(mut report: String) -> String {
    if !report.ends_with('\n') {
        report.push('\n');
    }
    report
}

fn info_row(info: &LicenseInfo) -> [String; 5] {
    [
        info.name.clone(),
        info.version.clone(),
        info.licenses.join(" | "),
        info.source.to_string(),
        info.homepage.clone().unwrap_or_default(),
    ]
}

fn finding_row(finding: &Finding) -> [String; 5] {
    let [name, version, licenses, source, _] = info_row(&finding.info);
    [name, version, licenses, source, finding.reason.clone()]
}
