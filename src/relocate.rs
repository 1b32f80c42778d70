//! Asset relocation into the canonical serving directory.
//!
//! The resolved content root's entries are moved (never copied) into
//! `<build>/public` via a scoped temporary directory created inside the
//! build directory, so the final step is an atomic same-filesystem rename.
//! A failure partway through never leaves an output tree that looks
//! successful: `public` only appears once the rename lands.
//!
//! Physically separating content from code/config means non-content files
//! at the source root are unreachable from the server even when the root is
//! the source tree itself.

use crate::buildlog::BuildLog;
use crate::error::BuildError;
use crate::paths::ResolvedRoot;
use crate::staticfile::StaticConfig;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the serving directory under the build dir.
pub const PUBLIC_DIR: &str = "public";

const TMP_PREFIX: &str = ".staticpack-approot.";

/// Platform metadata that must never be served.
const SKIP_ENTRIES: &[&str] = &[
    "Staticfile",
    "Staticfile.auth",
    "manifest.yml",
    ".profile",
    ".profile.d",
    "stackato.yml",
    ".cloudfoundry",
    ".staticpack",
];

/// Moves the content root into `<build>/public` and returns the serving
/// path. No-op when the resolved root already is the serving directory.
pub fn relocate_assets(
    build_dir: &Path,
    root: &ResolvedRoot,
    config: &StaticConfig,
    log: &BuildLog,
) -> Result<PathBuf, BuildError> {
    log.begin_step("Moving application content into public");

    let build_dir = build_dir
        .canonicalize()
        .context("build directory is not accessible")?;
    let public_dir = build_dir.join(PUBLIC_DIR);

    if root.path == public_dir {
        log.info("content root already is the serving directory");
        return Ok(public_dir);
    }

    let staging = tempfile::Builder::new()
        .prefix(TMP_PREFIX)
        .tempdir_in(&build_dir)
        .context("unable to create staging directory")?;

    for entry in fs::read_dir(&root.path).context("unable to list content root")? {
        let entry = entry.context("unable to list content root")?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();

        if SKIP_ENTRIES.contains(&name_str.as_ref()) {
            continue;
        }
        // The staging directory itself shows up when root is the build dir.
        if name_str.starts_with(TMP_PREFIX) {
            continue;
        }
        if name_str.starts_with('.') && !config.host_dot_files {
            continue;
        }

        fs::rename(entry.path(), staging.path().join(&name))
            .with_context(|| format!("unable to move `{}` into staging", name_str))?;
    }

    if public_dir.exists() {
        fs::remove_dir_all(&public_dir).context("unable to clear previous serving directory")?;
    }

    // Disarm the guard: from here the directory is the serving tree.
    let staged = staging.into_path();
    fs::rename(&staged, &public_dir).context("unable to move staged content into place")?;

    Ok(public_dir)
}
