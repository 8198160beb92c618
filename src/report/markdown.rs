use super::{finding_row, info_row, CHECK_HEADERS, LIST_HEADERS};
use crate::models::{CheckResult, LicenseInfo};

pub fn render_list(infos: &[LicenseInfo]) -> String {
    markdown_table(&LIST_HEADERS, infos.iter().map(info_row))
}

pub fn render_check(result: &CheckResult) -> String {
    [
        section(
            "PASSED",
            markdown_table(&LIST_HEADERS, result.passed.iter().map(info_row)),
        ),
        section(
            "VIOLATIONS",
            markdown_table(&CHECK_HEADERS, result.violations.iter().map(finding_row)),
        ),
        section(
            "WARNINGS",
            markdown_table(&CHECK_HEADERS, result.warnings.iter().map(finding_row)),
        ),
    ]
    .join("\n\n")
}

fn section(title: &str, table: String) -> String {
    format!("## {}\n\n{}", title, table)
}

fn markdown_table<I>(headers: &[&str], rows: I) -> String
where
    I: Iterator<Item = [String; 5]>,
{
    let mut lines = vec![
        format!("| {} |", headers.join(" | ")),
        format!("| {} |", vec!["---"; headers.len()].join(" | ")),
    ];

    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| cell.replace('|', "\\|")).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Finding, LicenseSource};

    fn info(name: &str) -> LicenseInfo {
        LicenseInfo {
            name: name.to_string(),
            version: "0.3.2".to_string(),
            licenses: vec!["MIT".to_string(), "Ruby".to_string()],
            source: LicenseSource::Local,
            homepage: None,
        }
    }

    #[test]
    fn test_list_escapes_pipes() {
        let out = render_list(&[info("gamma")]);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "| Gem | Version | License | Source | Homepage |");
        assert_eq!(lines[1], "| --- | --- | --- | --- | --- |");
        assert_eq!(lines[2], "| gamma | 0.3.2 | MIT \\| Ruby | local |  |");
    }

    #[test]
    fn test_check_sections() {
        let result = CheckResult {
            passed: Vec::new(),
            violations: Vec::new(),
            warnings: vec![Finding::new(info("gamma"), "License not specified")],
        };
        let out = render_check(&result);
        assert!(out.starts_with("## PASSED"));
        assert!(out.contains("## VIOLATIONS"));
        assert!(out.contains("## WARNINGS"));
        assert!(out.contains("| License not specified |"));
    }
}
