//! Staticfile parsing.
//!
//! The configuration format is line-oriented: one directive per line, either
//! `key: value` or a bare `key` meaning boolean true. Blank lines and `#`
//! comments are ignored. The schema is closed and versioned: every key is a
//! tagged variant with an explicit default, and unknown keys are routed to a
//! non-fatal warning channel for forward compatibility.
//!
//! Parsing is deterministic and side-effect-free beyond reading the file.

use crate::detect::STATICFILE_NAME;
use crate::error::BuildError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// A reverse-proxy mapping: requests under `path` are forwarded to
/// `upstream` and the response body returned as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyMapping {
    pub path: String,
    pub upstream: String,
}

/// The validated options structure. Unset options take safe defaults:
/// dotfiles hidden, directory listing off, SSI and env exposure off,
/// auth off.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StaticConfig {
    /// Alternate content root, relative to the build directory. `None`
    /// means the build directory itself.
    pub root: Option<String>,
    pub host_dot_files: bool,
    pub directory_listing: bool,
    pub ssi: bool,
    pub ssi_expose_env: bool,
    pub pushstate: bool,
    pub hsts: bool,
    pub hsts_include_subdomains: bool,
    pub hsts_preload: bool,
    pub force_https: bool,
    /// Path of an extra directives file included inside the generated
    /// `location /` block.
    pub location_include: Option<String>,
    /// Custom response headers, in declaration order.
    pub headers: Vec<(String, String)>,
    /// Reverse-proxy mappings, in declaration order.
    pub proxies: Vec<ProxyMapping>,
    /// Derived from the presence of `Staticfile.auth`, not from a key.
    #[serde(skip)]
    pub basic_auth: bool,
}

impl StaticConfig {
    pub fn root_or_default(&self) -> &str {
        self.root.as_deref().unwrap_or(".")
    }

    /// Whether the user explicitly configured an alternate root. `root: .`
    /// counts as unset for the override-directory warning.
    pub fn has_explicit_root(&self) -> bool {
        matches!(self.root.as_deref(), Some(r) if r != "." && !r.is_empty())
    }
}

/// Result of a parse: the options plus the non-fatal warning lines.
#[derive(Debug, Default)]
pub struct ParsedStaticfile {
    pub config: StaticConfig,
    pub warnings: Vec<String>,
}

/// The closed key schema. Adding a key here is a versioned schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Root,
    HostDotFiles,
    Directory,
    Ssi,
    SsiExposeEnv,
    Pushstate,
    Hsts,
    HstsIncludeSubdomains,
    HstsPreload,
    ForceHttps,
    LocationInclude,
    Header,
    Proxy,
}

impl Key {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "root" => Some(Key::Root),
            "host_dot_files" => Some(Key::HostDotFiles),
            "directory" => Some(Key::Directory),
            "ssi" => Some(Key::Ssi),
            "ssi_expose_env" => Some(Key::SsiExposeEnv),
            "pushstate" => Some(Key::Pushstate),
            "http_strict_transport_security" => Some(Key::Hsts),
            "http_strict_transport_security_include_subdomains" => Some(Key::HstsIncludeSubdomains),
            "http_strict_transport_security_preload" => Some(Key::HstsPreload),
            "force_https" => Some(Key::ForceHttps),
            "location_include" => Some(Key::LocationInclude),
            "header" => Some(Key::Header),
            "proxy" => Some(Key::Proxy),
            _ => None,
        }
    }
}

/// Boolean coercion: `true` and `enabled` switch a feature on; everything
/// else (including the empty value) leaves it off. A bare key parses as
/// `true`.
fn is_enabled(value: &str) -> bool {
    matches!(value, "true" | "enabled")
}

/// Loads and parses `<dir>/Staticfile`.
///
/// A missing file yields all defaults when `allow_missing` (fallback-mode
/// compilers); strict compilers turn it into `MissingConfiguration` with its
/// own exit code.
pub fn load(dir: &Path, allow_missing: bool) -> Result<ParsedStaticfile, BuildError> {
    let path = dir.join(STATICFILE_NAME);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if allow_missing {
                return Ok(ParsedStaticfile::default());
            }
            return Err(BuildError::MissingConfiguration(dir.to_path_buf()));
        }
        Err(err) => return Err(BuildError::InvalidConfiguration(err.to_string())),
    };

    parse(&content)
}

/// Parses Staticfile content. Unknown keys warn; known keys with malformed
/// values fail; conflicting proxy mappings for the same path fail.
pub fn parse(content: &str) -> Result<ParsedStaticfile, BuildError> {
    let mut parsed = ParsedStaticfile::default();

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (line, "true"),
        };

        let Some(key) = Key::from_name(name) else {
            parsed
                .warnings
                .push(format!("ignoring unknown Staticfile key `{}`", name));
            continue;
        };

        apply(&mut parsed.config, key, value, idx + 1)?;
    }

    Ok(parsed)
}

fn apply(config: &mut StaticConfig, key: Key, value: &str, line: usize) -> Result<(), BuildError> {
    match key {
        Key::Root => {
            if !value.is_empty() {
                config.root = Some(value.to_string());
            }
        }
        Key::HostDotFiles => config.host_dot_files = is_enabled(value),
        Key::Directory => config.directory_listing = is_enabled(value),
        Key::Ssi => config.ssi = is_enabled(value),
        Key::SsiExposeEnv => config.ssi_expose_env = is_enabled(value),
        Key::Pushstate => config.pushstate = is_enabled(value),
        Key::Hsts => config.hsts = is_enabled(value),
        Key::HstsIncludeSubdomains => config.hsts_include_subdomains = is_enabled(value),
        Key::HstsPreload => config.hsts_preload = is_enabled(value),
        Key::ForceHttps => config.force_https = is_enabled(value),
        Key::LocationInclude => {
            if !value.is_empty() {
                config.location_include = Some(value.to_string());
            }
        }
        Key::Header => {
            let Some((header_name, header_value)) = value.split_once(':') else {
                return Err(BuildError::InvalidConfiguration(format!(
                    "line {}: `header` expects `Name: value`",
                    line
                )));
            };
            config
                .headers
                .push((header_name.trim().to_string(), header_value.trim().to_string()));
        }
        Key::Proxy => {
            let mut parts = value.split_whitespace();
            let (Some(path), Some(upstream), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(BuildError::InvalidConfiguration(format!(
                    "line {}: `proxy` expects `<path> <upstream-url>`",
                    line
                )));
            };
            if let Some(existing) = config.proxies.iter().find(|p| p.path == path) {
                if existing.upstream != upstream {
                    return Err(BuildError::ConfigurationConflict(format!(
                        "proxy path `{}` is mapped to both `{}` and `{}`",
                        path, existing.upstream, upstream
                    )));
                }
                // Exact duplicate, keep the first.
                return Ok(());
            }
            config.proxies.push(ProxyMapping {
                path: path.to_string(),
                upstream: upstream.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_safe() {
        let config = StaticConfig::default();
        assert!(config.root.is_none());
        assert!(!config.host_dot_files);
        assert!(!config.directory_listing);
        assert!(!config.ssi);
        assert!(!config.ssi_expose_env);
        assert!(!config.pushstate);
        assert!(!config.hsts);
        assert!(!config.force_https);
        assert!(!config.basic_auth);
        assert_eq!(config.root_or_default(), ".");
    }

    #[test]
    fn test_key_value_and_bare_boolean_lines() {
        let parsed = parse("root: dist\nssi: enabled\npushstate\n").unwrap();
        assert_eq!(parsed.config.root.as_deref(), Some("dist"));
        assert!(parsed.config.ssi);
        assert!(parsed.config.pushstate);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let parsed = parse("# a comment\n\n  \nhost_dot_files: true\n").unwrap();
        assert!(parsed.config.host_dot_files);
    }

    #[test]
    fn test_boolean_coercion() {
        for value in ["true", "enabled"] {
            let parsed = parse(&format!("directory: {}\n", value)).unwrap();
            assert!(parsed.config.directory_listing, "value {:?}", value);
        }
        for value in ["false", "disabled", "yes", "on", ""] {
            let parsed = parse(&format!("directory: {}\n", value)).unwrap();
            assert!(!parsed.config.directory_listing, "value {:?}", value);
        }
    }

    #[test]
    fn test_unknown_keys_warn_and_are_ignored() {
        let parsed = parse("frobnicate: yes\nroot: public\n").unwrap();
        assert_eq!(parsed.config.root.as_deref(), Some("public"));
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("frobnicate"));
    }

    #[test]
    fn test_headers_accumulate_in_order() {
        let parsed =
            parse("header: X-Frame-Options: DENY\nheader: X-Custom: a: b\n").unwrap();
        assert_eq!(
            parsed.config.headers,
            vec![
                ("X-Frame-Options".to_string(), "DENY".to_string()),
                ("X-Custom".to_string(), "a: b".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_header_fails() {
        let err = parse("header: nocolon\n").err().expect("must fail");
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn test_proxies_accumulate() {
        let parsed =
            parse("proxy: /api http://backend:8080\nproxy: /auth http://auth:9000\n").unwrap();
        assert_eq!(parsed.config.proxies.len(), 2);
        assert_eq!(parsed.config.proxies[0].path, "/api");
        assert_eq!(parsed.config.proxies[0].upstream, "http://backend:8080");
    }

    #[test]
    fn test_conflicting_proxy_paths_fail() {
        let err = parse("proxy: /api http://a\nproxy: /api http://b\n")
            .err()
            .expect("must fail");
        assert_eq!(err.exit_code(), 16);
        assert!(err.to_string().contains("/api"));
    }

    #[test]
    fn test_duplicate_identical_proxy_is_deduped() {
        let parsed = parse("proxy: /api http://a\nproxy: /api http://a\n").unwrap();
        assert_eq!(parsed.config.proxies.len(), 1);
    }

    #[test]
    fn test_missing_file_strict_vs_fallback() {
        let dir = tempfile::TempDir::new().unwrap();

        let parsed = load(dir.path(), true).unwrap();
        assert!(parsed.config.root.is_none());

        let err = load(dir.path(), false).err().expect("strict must fail");
        assert_eq!(err.exit_code(), 10);
        assert!(err.to_string().contains("missing configuration file"));
    }

    #[test]
    fn test_explicit_root_detection() {
        assert!(!StaticConfig::default().has_explicit_root());
        let parsed = parse("root: .\n").unwrap();
        assert!(!parsed.config.has_explicit_root());
        let parsed = parse("root: public\n").unwrap();
        assert!(parsed.config.has_explicit_root());
    }
}
