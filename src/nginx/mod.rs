//! Server configuration synthesis.
//!
//! [`ServerConfigGenerator::generate`] is a pure function of the validated
//! options and resolved facts: the same inputs always produce byte-identical
//! output. The feature toggles are composed by an ordered list of
//! contributor functions (see [`contributors`]) instead of ad hoc string
//! concatenation, so precedence is explicit and each feature is testable in
//! isolation.
//!
//! Writing the result to disk is a separate, small step so generation stays
//! side-effect-free.

mod contributors;
pub mod data;

use crate::buildlog::BuildLog;
use crate::config::PlatformEnv;
use crate::credentials::Credentials;
use crate::error::BuildError;
use crate::relocate::PUBLIC_DIR;
use crate::staticfile::StaticConfig;
use anyhow::Context;
use contributors::{ContributorInput, Fragment, Placement, CONTRIBUTORS};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Which features ended up enabled, for diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureSet {
    pub enabled: Vec<&'static str>,
}

/// The synthesized server configuration. Immutable after creation.
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    pub text: String,
    pub features: FeatureSet,
}

pub struct ServerConfigGenerator<'a> {
    pub config: &'a StaticConfig,
    pub credentials: Option<&'a Credentials>,
    pub env: &'a PlatformEnv,
}

impl<'a> ServerConfigGenerator<'a> {
    pub fn generate(&self) -> GeneratedConfig {
        let input = ContributorInput {
            config: self.config,
            credentials: self.credentials,
            stack: &self.env.stack,
        };

        let mut features = FeatureSet::default();
        let mut server = Vec::new();
        let mut location = Vec::new();
        let mut extra = Vec::new();

        for contributor in CONTRIBUTORS {
            let Some(fragment) = contributor(&input) else {
                continue;
            };
            features.enabled.push(fragment.feature);
            match fragment.placement {
                Placement::Server => server.push(fragment),
                Placement::Location => location.push(fragment),
                Placement::ExtraLocation => extra.push(fragment),
            }
        }

        GeneratedConfig {
            text: render(&server, &location, &extra),
            features,
        }
    }
}

fn render(server: &[Fragment], location: &[Fragment], extra: &[Fragment]) -> String {
    let mut out = String::new();

    out.push_str("worker_processes 1;\n");
    out.push_str("daemon off;\n\n");
    // Regular and error logs must be forward-able, never files on disk.
    out.push_str("error_log /dev/stderr;\n");
    out.push_str("events { worker_connections 1024; }\n\n");
    out.push_str("http {\n");
    out.push_str("  charset utf-8;\n");
    out.push_str(
        "  log_format staging '$http_x_forwarded_for - $http_referer - [$time_local] \"$request\" $status $body_bytes_sent';\n",
    );
    out.push_str("  access_log /dev/stdout staging;\n");
    out.push_str("  default_type application/octet-stream;\n");
    out.push_str("  include mime.types;\n");
    out.push_str("  sendfile on;\n\n");
    // Compression: gzip eligible text assets for clients that advertise
    // support, gunzip precompressed assets for clients that do not.
    out.push_str("  gzip on;\n");
    out.push_str("  gzip_disable \"msie6\";\n");
    out.push_str("  gzip_comp_level 6;\n");
    out.push_str("  gzip_min_length 1100;\n");
    out.push_str("  gzip_buffers 16 8k;\n");
    out.push_str("  gzip_proxied any;\n");
    out.push_str("  gunzip on;\n");
    out.push_str("  gzip_static always;\n");
    out.push_str(
        "  gzip_types text/plain text/css text/js text/xml text/javascript application/javascript application/x-javascript application/json application/xml application/xml+rss;\n",
    );
    out.push_str("  gzip_vary on;\n\n");
    out.push_str("  tcp_nopush on;\n");
    out.push_str("  keepalive_timeout 30;\n");
    out.push_str("  port_in_redirect off;\n");
    out.push_str("  server_tokens off;\n\n");
    out.push_str("  server {\n");
    out.push_str("    listen __PORT__;\n");
    out.push_str("    server_name localhost;\n\n");
    out.push_str(&format!("    root __APP_ROOT__/{};\n", PUBLIC_DIR));
    out.push_str("    index index.html index.htm Default.htm;\n");

    for fragment in server {
        out.push('\n');
        push_lines(&mut out, &fragment.lines, "    ");
    }

    out.push_str("\n    location / {\n");
    for (idx, fragment) in location.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        push_lines(&mut out, &fragment.lines, "      ");
    }
    out.push_str("    }\n");

    for fragment in extra {
        out.push('\n');
        push_lines(&mut out, &fragment.lines, "    ");
    }

    out.push_str("  }\n");
    out.push_str("}\n");
    out
}

fn push_lines(out: &mut String, lines: &[String], indent: &str) {
    for line in lines {
        out.push_str(indent);
        out.push_str(line);
        out.push('\n');
    }
}

/// Conf-directory layout under the build dir.
pub const CONF_DIR: &str = "nginx/conf";
const LOGS_DIR: &str = "nginx/logs";

/// Writes the generated configuration under `<build>/nginx/conf`.
///
/// Files of the same name found inside the serving tree override the
/// generated ones (they are moved out of the serving tree); overriding
/// `nginx.conf` this way defeats the Staticfile directives and logs a
/// deprecation warning.
pub fn write_config(
    build_dir: &Path,
    generated: &GeneratedConfig,
    credentials: Option<&Credentials>,
    log: &BuildLog,
) -> Result<PathBuf, BuildError> {
    let conf_dir = build_dir.join(CONF_DIR);
    fs::create_dir_all(&conf_dir).context("unable to create nginx conf directory")?;
    fs::create_dir_all(build_dir.join(LOGS_DIR)).context("unable to create nginx logs directory")?;

    let files: [(&str, &str); 2] = [
        ("nginx.conf", generated.text.as_str()),
        ("mime.types", data::MIME_TYPES),
    ];

    for (name, contents) in files {
        let dest = conf_dir.join(name);
        let custom = build_dir.join(PUBLIC_DIR).join(name);
        if custom.is_file() {
            if name == "nginx.conf" {
                log.warning(
                    "overriding nginx.conf is deprecated and highly discouraged, as it breaks the functionality of the Staticfile and Staticfile.auth configuration directives",
                );
            }
            fs::rename(&custom, &dest)
                .with_context(|| format!("unable to move custom {} into place", name))?;
        } else {
            fs::write(&dest, contents).with_context(|| format!("unable to write {}", name))?;
        }
    }

    if let Some(credentials) = credentials {
        fs::write(conf_dir.join(".htpasswd"), credentials.render_htpasswd())
            .context("unable to write .htpasswd")?;
    }

    Ok(conf_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staticfile;
    use tempfile::TempDir;

    fn generate(config: &StaticConfig) -> GeneratedConfig {
        let env = PlatformEnv::default();
        ServerConfigGenerator {
            config,
            credentials: None,
            env: &env,
        }
        .generate()
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = staticfile::parse(
            "root: dist\nssi: enabled\npushstate\nforce_https: true\nheader: X-A: 1\n",
        )
        .unwrap()
        .config;
        let first = generate(&config);
        let second = generate(&config);
        assert_eq!(first.text, second.text);
    }

    #[test]
    fn test_default_config_has_baseline_only() {
        let generated = generate(&StaticConfig::default());
        assert_eq!(generated.features.enabled, vec!["dotfile_guard"]);
        let text = &generated.text;
        assert!(text.contains("listen __PORT__;"));
        assert!(text.contains("root __APP_ROOT__/public;"));
        assert!(text.contains("index index.html index.htm Default.htm;"));
        assert!(text.contains("location ~ /\\."));
        assert!(!text.contains("autoindex"));
        assert!(!text.contains("ssi on"));
        assert!(!text.contains("auth_basic"));
        assert!(!text.contains("Strict-Transport-Security"));
    }

    #[test]
    fn test_logs_go_to_standard_streams() {
        let text = generate(&StaticConfig::default()).text;
        assert!(text.contains("error_log /dev/stderr;"));
        assert!(text.contains("access_log /dev/stdout"));
    }

    #[test]
    fn test_compression_defaults_serve_both_encodings() {
        let text = generate(&StaticConfig::default()).text;
        assert!(text.contains("gzip on;"));
        assert!(text.contains("gzip_static always;"));
        assert!(text.contains("gunzip on;"));
    }

    #[test]
    fn test_https_redirect_precedes_location_block() {
        let config = staticfile::parse("force_https: enabled\n").unwrap().config;
        let text = generate(&config).text;
        let redirect = text.find("return 301 https://").unwrap();
        let location = text.find("location / {").unwrap();
        assert!(redirect < location);
    }

    #[test]
    fn test_directory_listing_keeps_index_resolution() {
        let config = staticfile::parse("directory: enabled\n").unwrap().config;
        let text = generate(&config).text;
        assert!(text.contains("autoindex on;"));
        assert!(text.contains("index index.html index.htm Default.htm;"));
    }

    #[test]
    fn test_basic_auth_requires_credentials() {
        let env = PlatformEnv::default();
        let config = StaticConfig::default();

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Staticfile.auth"), "u:h\n").unwrap();
        let creds = crate::credentials::load(dir.path()).unwrap();

        let with = ServerConfigGenerator {
            config: &config,
            credentials: creds.as_ref(),
            env: &env,
        }
        .generate();
        assert!(with.text.contains("auth_basic \"Restricted\";"));
        assert!(with.features.enabled.contains(&"basic_auth"));

        let without = generate(&config);
        assert!(!without.text.contains("auth_basic"));
    }

    #[test]
    fn test_write_config_creates_layout() {
        let dir = TempDir::new().unwrap();
        let generated = generate(&StaticConfig::default());

        let conf_dir =
            write_config(dir.path(), &generated, None, &BuildLog::silent(false)).unwrap();

        assert!(conf_dir.join("nginx.conf").is_file());
        assert!(conf_dir.join("mime.types").is_file());
        assert!(dir.path().join("nginx/logs").is_dir());
        assert!(!conf_dir.join(".htpasswd").exists());
    }

    #[test]
    fn test_custom_nginx_conf_overrides_and_warns() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join("public/nginx.conf"), "custom config\n").unwrap();

        let generated = generate(&StaticConfig::default());
        let log = BuildLog::silent(false);
        let conf_dir = write_config(dir.path(), &generated, None, &log).unwrap();

        let written = std::fs::read_to_string(conf_dir.join("nginx.conf")).unwrap();
        assert_eq!(written, "custom config\n");
        // Moved out of the serving tree.
        assert!(!dir.path().join("public/nginx.conf").exists());
        assert!(log.lines().iter().any(|l| l.contains("deprecated")));
    }

    #[test]
    fn test_htpasswd_written_from_credentials() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Staticfile.auth"), "alice:hash123\n").unwrap();
        let creds = crate::credentials::load(dir.path()).unwrap();

        let generated = generate(&StaticConfig::default());
        let conf_dir = write_config(
            dir.path(),
            &generated,
            creds.as_ref(),
            &BuildLog::silent(false),
        )
        .unwrap();

        let htpasswd = std::fs::read_to_string(conf_dir.join(".htpasswd")).unwrap();
        assert_eq!(htpasswd, "alice:hash123\n");
    }
}
