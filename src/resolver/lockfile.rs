//! Line-oriented parser for Bundler's `Gemfile.lock`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static SPEC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) \(([^()\-\s]+)(?:-([^()\s]+))?\)$").expect("valid regex")
});

static SPEC_DEPENDENCY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)(?: \((.+)\))?$").expect("valid regex"));

static DIRECT_DEPENDENCY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+?)(?: \((.+)\))?(!)?$").expect("valid regex"));

const CONFLICT_MARKERS: [&str; 4] = ["<<<<<<<", "|||||||", "=======", ">>>>>>>"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// One entry of a `specs:` block, platform suffix stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedSpec {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    pub specs: Vec<LockedSpec>,
    /// Gem names listed under `DEPENDENCIES`.
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// `GEM`, `GIT`, `PATH`, `PLUGIN SOURCE`
    Source { in_specs: bool },
    Dependencies,
    /// Sections whose content does not affect resolution.
    Ignored,
}

fn section_for(header: &str) -> Section {
    match header {
        "GEM" | "GIT" | "PATH" | "PLUGIN SOURCE" => Section::Source { in_specs: false },
        "DEPENDENCIES" => Section::Dependencies,
        _ => Section::Ignored,
    }
}

/// Parse the text of a `Gemfile.lock`.
pub fn parse(content: &str) -> Result<Lockfile, SyntaxError> {
    let mut lockfile = Lockfile::default();
    let mut section: Option<Section> = None;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();

        if line.is_empty() {
            continue;
        }

        if CONFLICT_MARKERS.iter().any(|m| line.starts_with(m)) {
            return Err(SyntaxError::new(
                line_no,
                "merge conflict marker found; resolve the conflict and run `bundle install`",
            ));
        }

        let indent = line.len() - line.trim_start_matches(' ').len();
        let body = &line[indent..];

        if indent == 0 {
            section = Some(section_for(body));
            continue;
        }

        let Some(current) = section.as_mut() else {
            return Err(SyntaxError::new(
                line_no,
                "indented entry before any section header",
            ));
        };

        match current {
            Section::Source { in_specs } => match indent {
                2 => *in_specs = body == "specs:",
                4 if *in_specs => {
                    let caps = SPEC_LINE.captures(body).ok_or_else(|| {
                        SyntaxError::new(line_no, format!("malformed spec entry '{}'", body))
                    })?;
                    lockfile.specs.push(LockedSpec {
                        name: caps[1].to_string(),
                        version: caps[2].to_string(),
                    });
                }
                6 if *in_specs => {
                    if !SPEC_DEPENDENCY_LINE.is_match(body) {
                        return Err(SyntaxError::new(
                            line_no,
                            format!("malformed dependency entry '{}'", body),
                        ));
                    }
                    if lockfile.specs.is_empty() {
                        return Err(SyntaxError::new(
                            line_no,
                            "dependency entry without a parent spec",
                        ));
                    }
                }
                _ => {
                    return Err(SyntaxError::new(
                        line_no,
                        format!("unexpected indentation ({} spaces)", indent),
                    ));
                }
            },
            Section::Dependencies => {
                if indent != 2 {
                    return Err(SyntaxError::new(
                        line_no,
                        format!("unexpected indentation ({} spaces)", indent),
                    ));
                }
                let caps = DIRECT_DEPENDENCY_LINE.captures(body).ok_or_else(|| {
                    SyntaxError::new(line_no, format!("malformed dependency entry '{}'", body))
                })?;
                lockfile.dependencies.push(caps[1].to_string());
            }
            Section::Ignored => {}
        }
    }

    Ok(lockfile)
}
