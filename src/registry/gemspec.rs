use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{collect_licenses, LocalSource, PackageMetadata};

static LICENSES_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\w+\.licenses\s*=\s*\[([^\]]*)\]").expect("valid regex"));

static LICENSE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*\w+\.license\s*=\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});

static HOMEPAGE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*\w+\.homepage\s*=\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});

static SOURCE_CODE_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""source_code_uri"\s*=>\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});

/// A RubyGems version, optionally followed by a platform ("1.16.0-x86_64-linux").
static INSTALLED_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.[0-9A-Za-z]+)*(?:-[A-Za-z][0-9A-Za-z_.\-]*)?$").expect("valid regex")
});

const SYSTEM_GEM_ROOTS: [&str; 3] = ["/var/lib/gems", "/usr/lib/ruby/gems", "/usr/local/lib/ruby/gems"];

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid regex"));

/// Reads the gemspecs RubyGems writes under `<gem dir>/specifications/`
/// (and `specifications/default/` for gems bundled with Ruby).
///
/// The locked version is looked for in every directory before falling back
/// to the newest installed version; earlier directories win ties.
pub struct GemspecDirectory {
    gem_paths: Vec<PathBuf>,
}

impl GemspecDirectory {
    pub fn new(gem_paths: Vec<PathBuf>) -> Self {
        Self { gem_paths }
    }

    fn spec_dirs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.gem_paths.iter().flat_map(|gem_path| {
            let specs = gem_path.join("specifications");
            [specs.clone(), specs.join("default")]
        })
    }

    /// Locate the installed gemspec for `name`, preferring the locked version.
    fn find_spec_file(&self, name: &str, version: &str) -> Option<PathBuf> {
        let exact_name = format!("{}-{}.gemspec", name, version);
        if let Some(exact) = self
            .spec_dirs()
            .map(|dir| dir.join(&exact_name))
            .find(|path| path.is_file())
        {
            return Some(exact);
        }

        let candidates: Vec<(String, PathBuf)> = self
            .spec_dirs()
            .flat_map(|dir| installed_versions(&dir, name))
            .collect();

        // `max_by` keeps the last of equal elements; reversing makes the first directory win.
        candidates
            .into_iter()
            .rev()
            .max_by(|(a, _), (b, _)| compare_versions(a, b))
            .map(|(_, path)| path)
    }
}

impl LocalSource for GemspecDirectory {
    fn lookup(&self, name: &str, version: &str) -> Option<PackageMetadata> {
        let Some(path) = self.find_spec_file(name, version) else {
            debug!(gem = name, "not installed locally");
            return None;
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!(gem = name, path = %path.display(), error = %e, "unreadable gemspec");
                return None;
            }
        };

        let metadata = parse_gemspec(&content);
        if metadata.is_none() {
            debug!(gem = name, path = %path.display(), "gemspec declares no license");
        }
        metadata
    }
}

/// Extract license metadata from a RubyGems-generated gemspec.
///
/// `None` when the spec declares no non-empty license.
pub fn parse_gemspec(content: &str) -> Option<PackageMetadata> {
    let list: Vec<String> = LICENSES_FIELD
        .captures(content)
        .map(|caps| {
            STRING_LITERAL
                .captures_iter(&caps[1])
                .map(|lit| unescape(&lit[1]))
                .collect()
        })
        .unwrap_or_default();

    let single = LICENSE_FIELD.captures(content).map(|caps| unescape(&caps[1]));

    let licenses = collect_licenses(list, single.as_deref());
    if licenses.is_empty() {
        return None;
    }

    let capture = |re: &Regex| {
        re.captures(content)
            .map(|caps| unescape(&caps[1]).trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Some(PackageMetadata {
        licenses,
        homepage: capture(&*HOMEPAGE_FIELD),
        source_code_uri: capture(&*SOURCE_CODE_URI),
    })
}

fn unescape(literal: &str) -> String {
    literal.replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Every `<name>-<version>.gemspec` in `dir` as `(version, path)`.
fn installed_versions(dir: &Path, name: &str) -> Vec<(String, PathBuf)> {
    let prefix = format!("{}-", name);
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name().into_string().ok()?;
            let version = file_name
                .strip_prefix(&prefix)?
                .strip_suffix(".gemspec")?;
            // "rails-html-sanitizer-1.6.0" and "oauth2-2fa-9.0.0" are other gems
            if !INSTALLED_VERSION.is_match(version) {
                return None;
            }
            Some((version.to_string(), entry.path()))
        })
        .collect()
}

/// Gem directories of the project's Bundler install.
///
/// `bundle_path` is `BUNDLE_PATH` from the environment; otherwise the value in
/// `<project>/.bundle/config`, otherwise `vendor/bundle`. Gems live one level
/// down, in `<bundle path>/ruby/<abi>/`.
pub fn bundle_gem_paths(project_dir: &Path, bundle_path: Option<PathBuf>) -> Vec<PathBuf> {
    let bundle_path = bundle_path
        .or_else(|| configured_bundle_path(project_dir))
        .unwrap_or_else(|| PathBuf::from("vendor").join("bundle"));

    abi_dirs(&project_dir.join(bundle_path).join("ruby"))
}

/// Per-user and system gem directories RubyGems installs into by default.
pub fn default_gem_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();

    if let Some(home) = home {
        roots.push(home.join(".gem").join("ruby"));
        roots.push(home.join(".local").join("share").join("gem").join("ruby"));

        let rbenv = home.join(".rbenv").join("versions");
        roots.extend(
            abi_dirs(&rbenv)
                .into_iter()
                .map(|ruby| ruby.join("lib").join("ruby").join("gems")),
        );
    }

    roots.extend(SYSTEM_GEM_ROOTS.iter().map(PathBuf::from));

    roots.iter().flat_map(|root| abi_dirs(root)).collect()
}

fn configured_bundle_path(project_dir: &Path) -> Option<PathBuf> {
    let config = std::fs::read_to_string(project_dir.join(".bundle").join("config")).ok()?;

    config.lines().find_map(|line| {
        let value = line.trim().strip_prefix("BUNDLE_PATH:")?;
        let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
        (!value.is_empty()).then(|| PathBuf::from(value))
    })
}

/// Version-named subdirectories of `root`, newest first.
fn abi_dirs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            name.starts_with(|c: char| c.is_ascii_digit())
                .then(|| (name, entry.path()))
        })
        .collect();

    dirs.sort_by(|(a, _), (b, _)| compare_versions(b, a));
    dirs.into_iter().map(|(_, path)| path).collect()
}

/// Segment-wise version ordering: numeric where both sides are numbers.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split(['.', '-']);
    let mut right = b.split(['.', '-']);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
