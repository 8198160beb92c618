use super::{info_row, LIST_HEADERS};
use crate::models::{CheckResult, Finding, LicenseInfo};

const CHECK_HEADERS: [&str; 6] = ["Gem", "Version", "License", "Source", "Status", "Reason"];

pub fn render_list(infos: &[LicenseInfo]) -> String {
    let mut out = line(LIST_HEADERS);
    for info in infos {
        out.push_str(&line(info_row(info)));
    }
    out
}

pub fn render_check(result: &CheckResult) -> String {
    let mut out = line(CHECK_HEADERS);

    for info in &result.passed {
        out.push_str(&line(status_row(info, "PASSED", "")));
    }
    for Finding { info, reason } in &result.violations {
        out.push_str(&line(status_row(info, "VIOLATION", reason)));
    }
    for Finding { info, reason } in &result.warnings {
        out.push_str(&line(status_row(info, "WARNING", reason)));
    }

    out
}

fn status_row(info: &LicenseInfo, status: &str, reason: &str) -> [String; 6] {
    let [name, version, licenses, source, _] = info_row(info);
    [
        name,
        version,
        licenses,
        source,
        status.to_string(),
        reason.to_string(),
    ]
}

fn line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut row = fields
        .into_iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

/// Quote a field containing a separator, quote or line break (RFC 4180).
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
