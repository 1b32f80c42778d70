//! Applicability detection.
//!
//! The platform may probe several compilers before selecting one, so this
//! predicate must stay cheap and side-effect-free: two `stat` calls at most.

use std::path::Path;

/// How strictly the compiler claims a source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectMode {
    /// A `Staticfile` must be present.
    Strict,
    /// Also claim trees that look like plain static content when no more
    /// specific compiler does.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Applicable,
    NotApplicable,
}

/// Name of the configuration file at the source root.
pub const STATICFILE_NAME: &str = "Staticfile";

/// Name of the credentials sidecar next to it.
pub const AUTH_FILE_NAME: &str = "Staticfile.auth";

pub fn detect(source_dir: &Path, mode: DetectMode) -> Detection {
    if source_dir.join(STATICFILE_NAME).is_file() {
        return Detection::Applicable;
    }

    if mode == DetectMode::Fallback && source_dir.join("index.html").is_file() {
        return Detection::Applicable;
    }

    Detection::NotApplicable
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_staticfile_present_is_applicable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Staticfile"), "root: public\n").unwrap();

        assert_eq!(detect(dir.path(), DetectMode::Strict), Detection::Applicable);
        assert_eq!(
            detect(dir.path(), DetectMode::Fallback),
            Detection::Applicable
        );
    }

    #[test]
    fn test_empty_tree_is_not_applicable() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            detect(dir.path(), DetectMode::Strict),
            Detection::NotApplicable
        );
        assert_eq!(
            detect(dir.path(), DetectMode::Fallback),
            Detection::NotApplicable
        );
    }

    #[test]
    fn test_index_html_satisfies_fallback_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        assert_eq!(
            detect(dir.path(), DetectMode::Strict),
            Detection::NotApplicable
        );
        assert_eq!(
            detect(dir.path(), DetectMode::Fallback),
            Detection::Applicable
        );
    }

    #[test]
    fn test_staticfile_directory_does_not_count() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Staticfile")).unwrap();
        assert_eq!(
            detect(dir.path(), DetectMode::Strict),
            Detection::NotApplicable
        );
    }
}
