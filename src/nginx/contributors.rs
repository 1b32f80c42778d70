//! Feature contributors.
//!
//! Each togglable feature is one function from the validated options and
//! resolved facts to an optional configuration fragment. Fragments are
//! assembled in the fixed order of [`CONTRIBUTORS`]; that order is the
//! documented precedence:
//!
//! 1. HTTPS enforcement sits at server level, ahead of every content
//!    directive, so redirects win over serving for the same path.
//! 2. Response headers (HSTS, custom) sit at server level and inherit into
//!    every location that does not define its own.
//! 3. Content behavior (pushstate, listing, auth, SSI, includes) composes
//!    inside `location /`.
//! 4. Proxy mappings are standalone location blocks; nginx longest-prefix
//!    matching makes the most specific path win.
//! 5. The dotfile guard is a regex location emitted last.

use crate::credentials::Credentials;
use crate::staticfile::StaticConfig;

/// Where a fragment lands in the assembled server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Directly inside the `server` block, before `location /`.
    Server,
    /// Inside the `location /` block.
    Location,
    /// After `location /`, as standalone blocks.
    ExtraLocation,
}

#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    pub feature: &'static str,
    pub placement: Placement,
    pub lines: Vec<String>,
}

/// Facts a contributor may consult.
pub(crate) struct ContributorInput<'a> {
    pub config: &'a StaticConfig,
    pub credentials: Option<&'a Credentials>,
    /// Execution-environment identifier, exposed to SSI when requested.
    pub stack: &'a str,
}

pub(crate) type Contributor = fn(&ContributorInput<'_>) -> Option<Fragment>;

/// The fixed, documented contribution order.
pub(crate) const CONTRIBUTORS: &[Contributor] = &[
    https_redirect,
    hsts,
    custom_headers,
    pushstate,
    directory_listing,
    basic_auth,
    ssi,
    location_include,
    proxy_locations,
    dotfile_guard,
];

fn https_redirect(input: &ContributorInput<'_>) -> Option<Fragment> {
    if !input.config.force_https {
        return None;
    }
    Some(Fragment {
        feature: "force_https",
        placement: Placement::Server,
        lines: vec![
            "if ($http_x_forwarded_proto != \"https\") {".into(),
            "  return 301 https://$host$request_uri;".into(),
            "}".into(),
        ],
    })
}

fn hsts(input: &ContributorInput<'_>) -> Option<Fragment> {
    if !input.config.hsts {
        return None;
    }
    let mut value = String::from("max-age=31536000");
    if input.config.hsts_include_subdomains {
        value.push_str("; includeSubDomains");
    }
    if input.config.hsts_preload {
        value.push_str("; preload");
    }
    Some(Fragment {
        feature: "hsts",
        placement: Placement::Server,
        lines: vec![format!(
            "add_header Strict-Transport-Security \"{}\";",
            value
        )],
    })
}

fn custom_headers(input: &ContributorInput<'_>) -> Option<Fragment> {
    if input.config.headers.is_empty() {
        return None;
    }
    Some(Fragment {
        feature: "custom_headers",
        placement: Placement::Server,
        lines: input
            .config
            .headers
            .iter()
            .map(|(name, value)| format!("add_header {} \"{}\";", name, value))
            .collect(),
    })
}

fn pushstate(input: &ContributorInput<'_>) -> Option<Fragment> {
    if !input.config.pushstate {
        return None;
    }
    Some(Fragment {
        feature: "pushstate",
        placement: Placement::Location,
        lines: vec![
            "if (!-e $request_filename) {".into(),
            "  rewrite ^(.*)$ / break;".into(),
            "}".into(),
        ],
    })
}

fn directory_listing(input: &ContributorInput<'_>) -> Option<Fragment> {
    if !input.config.directory_listing {
        return None;
    }
    Some(Fragment {
        feature: "directory_listing",
        placement: Placement::Location,
        lines: vec!["autoindex on;".into()],
    })
}

fn basic_auth(input: &ContributorInput<'_>) -> Option<Fragment> {
    input.credentials?;
    Some(Fragment {
        feature: "basic_auth",
        placement: Placement::Location,
        lines: vec![
            "auth_basic \"Restricted\";".into(),
            "auth_basic_user_file __APP_ROOT__/nginx/conf/.htpasswd;".into(),
        ],
    })
}

fn ssi(input: &ContributorInput<'_>) -> Option<Fragment> {
    if !input.config.ssi {
        return None;
    }
    let mut lines = vec!["ssi on;".into()];
    if input.config.ssi_expose_env {
        // Readable from includes via <!--#echo var="cf_stack" -->.
        lines.push(format!("set $cf_stack \"{}\";", input.stack));
    }
    Some(Fragment {
        feature: "ssi",
        placement: Placement::Location,
        lines,
    })
}

fn location_include(input: &ContributorInput<'_>) -> Option<Fragment> {
    let include = input.config.location_include.as_deref()?;
    Some(Fragment {
        feature: "location_include",
        placement: Placement::Location,
        lines: vec![format!("include {};", include)],
    })
}

fn proxy_locations(input: &ContributorInput<'_>) -> Option<Fragment> {
    if input.config.proxies.is_empty() {
        return None;
    }
    let mut lines = Vec::new();
    for mapping in &input.config.proxies {
        lines.push(format!("location {} {{", mapping.path));
        lines.push(format!("  proxy_pass {};", mapping.upstream));
        lines.push("  proxy_http_version 1.1;".into());
        lines.push("  proxy_set_header Host $host;".into());
        lines.push("}".into());
    }
    Some(Fragment {
        feature: "proxy",
        placement: Placement::ExtraLocation,
        lines,
    })
}

fn dotfile_guard(input: &ContributorInput<'_>) -> Option<Fragment> {
    if input.config.host_dot_files {
        return None;
    }
    Some(Fragment {
        feature: "dotfile_guard",
        placement: Placement::ExtraLocation,
        lines: vec![
            "location ~ /\\. {".into(),
            "  deny all;".into(),
            "  return 404;".into(),
            "}".into(),
        ],
    })
}
