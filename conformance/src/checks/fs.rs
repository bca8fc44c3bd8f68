//! Filesystem helpers shared by all checks.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use walkdir::{DirEntry, WalkDir};

use super::CheckError;

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "__pycache__", ".venv", "venv", "target"];

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| SKIPPED_DIRS.contains(&n))
}

/// Fails with [`CheckError::RootMissing`] unless `root` is a directory.
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory.
pub fn ensure_root(root: &Path) -> Result<(), CheckError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(CheckError::RootMissing(root.to_path_buf()))
    }
}

/// Returns every file under `root`, sorted by path.
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>, CheckError> {
    ensure_root(root)?;
    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    Ok(files)
}

/// Returns every directory under `root` (excluding `root`), sorted by path.
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory.
pub fn walk_dirs(root: &Path) -> Result<Vec<PathBuf>, CheckError> {
    ensure_root(root)?;
    let dirs = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    Ok(dirs)
}

/// A compiled file pattern.
///
/// A pattern without `/` is matched against the file name; a pattern with
/// `/` is matched against trailing components of the path relative to the
/// run root. Each component is a glob (`*`, `?`, `[a-z]`, `{py,pyi}`) that
/// never crosses a separator.
#[derive(Debug, Clone)]
pub struct PathPattern {
    components: Vec<GlobMatcher>,
}

impl PathPattern {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::InvalidPattern`] if a component is not a valid glob.
    pub fn new(pattern: &str) -> Result<Self, CheckError> {
        let components = pattern
            .trim_start_matches("./")
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|part| {
                Glob::new(part)
                    .map(|g| g.compile_matcher())
                    .map_err(|e| CheckError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { components })
    }

    /// Returns true if `path` (under `root`) matches.
    #[must_use]
    pub fn matches(&self, root: &Path, path: &Path) -> bool {
        let rel = relative(root, path);
        let parts: Vec<&str> = rel.split('/').collect();
        if self.components.is_empty() || self.components.len() > parts.len() {
            return false;
        }
        let tail = &parts[parts.len() - self.components.len()..];
        self.components
            .iter()
            .zip(tail)
            .all(|(glob, part)| glob.is_match(part))
    }
}

/// Compiles every pattern in `patterns`.
///
/// # Errors
///
/// Returns [`CheckError::InvalidPattern`] for the first invalid pattern.
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathPattern>, CheckError> {
    patterns.iter().map(|p| PathPattern::new(p.as_ref())).collect()
}

/// Returns files under `root` matching any of `patterns`, sorted by path.
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory or a pattern is
/// invalid.
pub fn files_matching<S: AsRef<str>>(root: &Path, patterns: &[S]) -> Result<Vec<PathBuf>, CheckError> {
    let compiled = compile_patterns(patterns)?;
    Ok(walk_files(root)?
        .into_iter()
        .filter(|f| compiled.iter().any(|p| p.matches(root, f)))
        .collect())
}

/// Returns files under `root` matching `pattern` (see [`PathPattern`]).
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory or `pattern` is
/// invalid.
pub fn find_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, CheckError> {
    files_matching(root, &[pattern])
}

/// Returns `path` relative to `root` with `/` separators.
#[must_use]
pub fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads a file as text; unreadable files are treated as absent.
#[must_use]
pub fn read_text(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

/// Returns the first directory under `root` with the given name.
///
/// # Errors
///
/// Returns an error if `root` is not an existing directory.
pub fn find_dir(root: &Path, name: &str) -> Result<Option<PathBuf>, CheckError> {
    Ok(walk_dirs(root)?
        .into_iter()
        .find(|d| d.file_name().is_some_and(|n| n == name)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hits(pattern: &str, path: &str) -> bool {
        PathPattern::new(pattern)
            .unwrap()
            .matches(Path::new("/r"), Path::new(path))
    }

    #[test]
    fn glob_wildcards() {
        assert!(hits("*.py", "/r/models.py"));
        assert!(hits("test*.py", "/r/app/test_models.py"));
        assert!(hits("ci.y?l", "/r/ci.yml"));
        assert!(hits("*.{yml,yaml}", "/r/ci.yaml"));
        assert!(!hits("*.py", "/r/models.pyc"));
        assert!(!hits("a*b", "/r/acbd"));
    }

    #[test]
    fn suffix_patterns() {
        let path = "/r/src/core/models.py";
        assert!(hits("models.py", path));
        assert!(hits("core/models.py", path));
        assert!(hits("./core/models.py", path));
        assert!(hits("*/models.py", path));
        assert!(!hits("users/models.py", path));
        assert!(!hits("a/b/c/d/models.py", path));
    }

    #[test]
    fn star_stays_within_a_component() {
        assert!(!hits("migrations/*.py", "/r/app/migrations/sub/0001.py"));
        assert!(hits("migrations/*.py", "/r/app/migrations/0001_initial.py"));
    }

    #[test]
    fn invalid_pattern_is_error() {
        let err = PathPattern::new("models[.py").unwrap_err();
        assert!(matches!(err, CheckError::InvalidPattern { ref pattern, .. } if pattern == "models[.py"));

        let dir = tempfile::tempdir().unwrap();
        let err = find_files(dir.path(), "src/{a,b").unwrap_err();
        assert!(matches!(err, CheckError::InvalidPattern { .. }));
    }

    #[test]
    fn walk_skips_vendor_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/x")).unwrap();
        std::fs::write(dir.path().join("node_modules/x/a.py"), "").unwrap();
        std::fs::write(dir.path().join("b.py"), "").unwrap();
        let files = walk_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("b.py"));
    }

    #[test]
    fn missing_root_is_error() {
        let err = walk_files(Path::new("/no/such/agv/root")).unwrap_err();
        assert!(matches!(err, CheckError::RootMissing(_)));
    }
}
