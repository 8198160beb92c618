use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use super::{finding_row, info_row, CHECK_HEADERS, LIST_HEADERS};
use crate::models::{CheckResult, LicenseInfo};

pub fn render_list(infos: &[LicenseInfo]) -> String {
    build_table(&LIST_HEADERS, infos.iter().map(info_row)).to_string()
}

pub fn render_check(result: &CheckResult) -> String {
    let sections = [
        (
            "PASSED".green().bold(),
            build_table(&LIST_HEADERS, result.passed.iter().map(info_row)),
        ),
        (
            "VIOLATIONS".red().bold(),
            build_table(&CHECK_HEADERS, result.violations.iter().map(finding_row)),
        ),
        (
            "WARNINGS".yellow().bold(),
            build_table(&CHECK_HEADERS, result.warnings.iter().map(finding_row)),
        ),
    ];

    let mut out: Vec<String> = sections
        .iter()
        .map(|(title, table)| format!("{}\n{}", title, table))
        .collect();

    out.push(format!(
        "Total: {}  Passed: {}  Violations: {}  Warnings: {}",
        result.total(),
        result.passed.len().to_string().green(),
        result.violations.len().to_string().red(),
        result.warnings.len().to_string().yellow(),
    ));

    out.join("\n\n")
}

fn build_table<I>(headers: &[&str], rows: I) -> Table
where
    I: Iterator<Item = [String; 5]>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );

    for row in rows {
        table.add_row(row.to_vec());
    }

    table
}
