//! Turns a `Gemfile.lock` into the list of dependencies to audit.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Dependency;

pub mod lockfile;

/// Bundler itself is always locked but never audited.
const BUNDLER_META_PACKAGE: &str = "bundler";

/// Resolve the dependencies locked in `lockfile_path`.
///
/// With `recursive` every locked spec is returned; otherwise only the
/// gems named under `DEPENDENCIES`. The result is unique by name and sorted
/// by name.
pub fn resolve(lockfile_path: &Path, recursive: bool) -> Result<Vec<Dependency>> {
    if !lockfile_path.exists() {
        return Err(Error::LockfileNotFound(lockfile_path.to_path_buf()));
    }

    let content = std::fs::read_to_string(lockfile_path).map_err(|source| Error::Io {
        path: lockfile_path.to_path_buf(),
        source,
    })?;

    let lock = lockfile::parse(&content).map_err(|e| Error::LockfileParse {
        path: lockfile_path.to_path_buf(),
        line: e.line,
        message: e.message,
    })?;

    Ok(select(&lock, recursive))
}

fn select(lock: &lockfile::Lockfile, recursive: bool) -> Vec<Dependency> {
    // First occurrence wins when a gem is locked for several platforms.
    let mut versions: BTreeMap<&str, &str> = BTreeMap::new();
    for spec in &lock.specs {
        versions
            .entry(spec.name.as_str())
            .or_insert(spec.version.as_str());
    }

    let names: Vec<&str> = if recursive {
        versions.keys().copied().collect()
    } else {
        lock.dependencies.iter().map(String::as_str).collect()
    };

    let mut resolved: BTreeMap<&str, Dependency> = BTreeMap::new();
    for name in names {
        if name == BUNDLER_META_PACKAGE {
            continue;
        }
        match versions.get(name) {
            Some(version) => {
                resolved
                    .entry(name)
                    .or_insert_with(|| Dependency::new(name, *version));
            }
            None => debug!(gem = name, "declared dependency has no locked spec; skipping"),
        }
    }

    resolved.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LOCKFILE: &str = r#"GEM
  remote: https://rubygems.org/
  specs:
    alpha (1.0.0)
      gamma (>= 0.1)
    beta (2.1.0)
    bundler (2.5.3)
    gamma (0.3.2)

PLATFORMS
  ruby

DEPENDENCIES
  beta
  alpha (~> 1.0)
  bundler

BUNDLED WITH
   2.5.3
"#;

    fn lockfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", content).unwrap();
        f
    }

    fn names(deps: &[Dependency]) -> Vec<&str> {
        deps.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_direct_dependencies_sorted() {
        let f = lockfile(LOCKFILE);
        let deps = resolve(f.path(), false).unwrap();
        assert_eq!(
            deps,
            vec![Dependency::new("alpha", "1.0.0"), Dependency::new("beta", "2.1.0")]
        );
    }

    #[test]
    fn test_recursive_includes_transitive() {
        let f = lockfile(LOCKFILE);
        let deps = resolve(f.path(), true).unwrap();
        assert_eq!(names(&deps), vec!["alpha", "beta", "gamma"]);
        assert_eq!(deps[2].version, "0.3.2");
    }

    #[test]
    fn test_bundler_always_excluded() {
        let f = lockfile(LOCKFILE);
        for recursive in [false, true] {
            let deps = resolve(f.path(), recursive).unwrap();
            assert!(!names(&deps).contains(&"bundler"));
        }
    }

    #[test]
    fn test_platform_variants_collapse() {
        let f = lockfile(
            "GEM\n  specs:\n    nokogiri (1.16.0-x86_64-linux)\n    nokogiri (1.16.0-arm64-darwin)\n\nDEPENDENCIES\n  nokogiri\n",
        );
        let deps = resolve(f.path(), true).unwrap();
        assert_eq!(deps, vec![Dependency::new("nokogiri", "1.16.0")]);
    }

    #[test]
    fn test_declared_without_spec_is_skipped() {
        let f = lockfile("GEM\n  specs:\n    rack (3.0.8)\n\nDEPENDENCIES\n  missing\n  rack\n");
        let deps = resolve(f.path(), false).unwrap();
        assert_eq!(names(&deps), vec!["rack"]);
    }

    #[test]
    fn test_missing_lockfile() {
        let err = resolve(Path::new("does/not/exist/Gemfile.lock"), false).unwrap_err();
        assert!(matches!(err, Error::LockfileNotFound(_)));
        assert!(err.to_string().contains("Gemfile.lock not found"));
    }

    #[test]
    fn test_unparseable_lockfile() {
        let f = lockfile("GEM\n  specs:\n=======\n");
        let err = resolve(f.path(), false).unwrap_err();
        assert!(matches!(err, Error::LockfileParse { line: 3, .. }));
    }
}
