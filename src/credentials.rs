//! Basic-authentication credential loading.
//!
//! Credentials come from a `Staticfile.auth` sidecar in htpasswd format, one
//! `user:password-hash` pair per line. Secrets are excluded from every error
//! and log path by construction: raw lines and hashes are never passed into
//! message formatting, and the `Debug` impl only reveals the entry count.

use crate::detect::AUTH_FILE_NAME;
use crate::error::BuildError;
use std::fmt;
use std::fs;
use std::path::Path;

/// Ordered set of (username, password-hash) pairs.
#[derive(Clone)]
pub struct Credentials {
    entries: Vec<(String, String)>,
}

impl Credentials {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the htpasswd payload written to the server's conf directory.
    /// The only place credential material leaves this type.
    pub fn render_htpasswd(&self) -> String {
        let mut out = String::new();
        for (user, hash) in &self.entries {
            out.push_str(user);
            out.push(':');
            out.push_str(hash);
            out.push('\n');
        }
        out
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials({} entries)", self.entries.len())
    }
}

/// Loads `<dir>/Staticfile.auth` if present.
///
/// Absence is not an error: basic auth is simply off. Malformed content is
/// `InvalidCredentials`, reported by line number only.
pub fn load(dir: &Path) -> Result<Option<Credentials>, BuildError> {
    let path = dir.join(AUTH_FILE_NAME);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(BuildError::InvalidCredentials(err.to_string())),
    };

    let mut entries = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once(':') {
            Some((user, hash)) if !user.is_empty() && !hash.is_empty() => {
                entries.push((user.to_string(), hash.to_string()));
            }
            _ => {
                return Err(BuildError::InvalidCredentials(format!(
                    "line {} is not a user:password-hash pair",
                    idx + 1
                )));
            }
        }
    }

    if entries.is_empty() {
        return Err(BuildError::InvalidCredentials(
            "file contains no credential pairs".to_string(),
        ));
    }

    Ok(Some(Credentials { entries }))
}
