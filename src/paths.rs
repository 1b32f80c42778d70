//! Content-root resolution and validation.
//!
//! Resolution runs before any filesystem mutation so that a failure leaves
//! the source tree untouched. It fails closed: a root that escapes the build
//! directory, does not exist, or is not a directory aborts the run.

use crate::error::{BuildError, RootError};
use std::path::{Component, Path, PathBuf};

/// The configured root resolved to a validated absolute path.
#[derive(Debug, Clone)]
pub struct ResolvedRoot {
    /// Canonical absolute path of the content root.
    pub path: PathBuf,
    /// The value as the user configured it, for diagnostics.
    pub configured: String,
}

/// Resolves `root` against the build directory.
pub fn resolve_root(build_dir: &Path, root: Option<&str>) -> Result<ResolvedRoot, BuildError> {
    let configured = root.unwrap_or(".").to_string();

    let build_dir = build_dir
        .canonicalize()
        .map_err(|err| anyhow::anyhow!("build directory is not accessible: {}", err))?;

    // Lexical normalization first, so `..` escapes are reported as escapes
    // even when the target does not exist.
    let joined = normalize(&build_dir.join(&configured));
    if !joined.starts_with(&build_dir) {
        return Err(RootError::EscapesSourceTree(configured).into());
    }

    let resolved = match joined.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => return Err(RootError::NotFound(configured).into()),
    };

    // Symlinks may still point outside the tree.
    if !resolved.starts_with(&build_dir) {
        return Err(RootError::EscapesSourceTree(configured).into());
    }

    if !resolved.is_dir() {
        return Err(RootError::NotDirectory(configured).into());
    }

    Ok(ResolvedRoot {
        path: resolved,
        configured,
    })
}

/// Resolves `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_root_resolves_to_build_dir() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_root(dir.path(), None).unwrap();
        assert_eq!(resolved.path, dir.path().canonicalize().unwrap());
        assert_eq!(resolved.configured, ".");
    }

    #[test]
    fn test_subdirectory_root_resolves() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("public")).unwrap();

        let resolved = resolve_root(dir.path(), Some("public")).unwrap();
        assert!(resolved.path.ends_with("public"));
        assert_eq!(resolved.configured, "public");
    }

    #[test]
    fn test_missing_root_is_named_in_the_error() {
        let dir = TempDir::new().unwrap();
        let err = resolve_root(dir.path(), Some("build")).err().expect("fail");
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("`build`"));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_plain_file_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("build"), "not a dir").unwrap();

        let err = resolve_root(dir.path(), Some("build")).err().expect("fail");
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("plain file"));
    }

    #[test]
    fn test_escaping_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = resolve_root(dir.path(), Some("../outside"))
            .err()
            .expect("fail");
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("escapes"));
    }

    #[test]
    fn test_dot_dot_within_tree_is_allowed() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();

        let resolved = resolve_root(dir.path(), Some("a/b/../b")).unwrap();
        assert!(resolved.path.ends_with("a/b"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_rejected() {
        let outside = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let err = resolve_root(dir.path(), Some("link")).err().expect("fail");
        assert_eq!(err.exit_code(), 12);
    }
}
