//! URL substitution: applying a cluster's address to a raw output URL.
//!
//! [`substitute`] is the entry point the resolver uses. The helpers below
//! implement the rules [`NamedCluster`](crate::NamedCluster) applies:
//!
//! | raw URL                     | result                          |
//! |-----------------------------|---------------------------------|
//! | `/`                         | cluster URL                     |
//! | `hc://<cluster>/path`       | cluster URL + `/path`           |
//! | `path` or `/path`           | cluster URL + `/path`           |
//! | `<cluster scheme>://a/path` | cluster URL + `/path`           |
//! | any other scheme            | unchanged                       |

use crate::definition::ClusterDefinition;
use crate::error::{ClusterError, Result};
use sinkpath_protocol::ResolutionContext;
use url::Url;

/// Scheme of named-cluster URLs (`hc://<cluster-name>/path`).
pub const NAMED_CLUSTER_SCHEME: &str = "hc";

/// Substitute `definition` into `raw_url`. Errors from the definition
/// propagate unchanged.
pub fn substitute(
    definition: &dyn ClusterDefinition,
    raw_url: &str,
    ctx: &ResolutionContext,
) -> Result<String> {
    definition.substitute(raw_url, ctx)
}

/// Split `scheme://authority/path` into its parts. Returns `None` for URLs
/// without a `://` delimiter.
pub fn split_url(raw_url: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = raw_url.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(is_scheme_char) {
        return None;
    }
    match rest.find('/') {
        Some(idx) => Some((scheme, &rest[..idx], &rest[idx..])),
        None => Some((scheme, rest, "")),
    }
}

fn is_scheme_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '+' || ch == '-' || ch == '.'
}

/// Build `scheme://[user[:password]@]host[:port]`.
pub fn cluster_base_url(
    scheme: &str,
    host: &str,
    port: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<String> {
    let mut url = Url::parse(&format!("{}://{}", scheme, host))
        .map_err(|e| ClusterError::substitution(format!("{}://{}", scheme, host), e.to_string()))?;

    if let Some(port) = port.filter(|p| !p.is_empty()) {
        let number: u16 = port.parse().map_err(|_| {
            ClusterError::substitution(url.as_str(), format!("invalid port '{}'", port))
        })?;
        url.set_port(Some(number))
            .map_err(|_| ClusterError::substitution(url.as_str(), "cannot set port"))?;
    }

    if let Some(user) = username.filter(|u| !u.is_empty()) {
        url.set_username(user)
            .map_err(|_| ClusterError::substitution(url.as_str(), "cannot set username"))?;
        if let Some(pass) = password.filter(|p| !p.is_empty()) {
            url.set_password(Some(pass))
                .map_err(|_| ClusterError::substitution(url.as_str(), "cannot set password"))?;
        }
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Join a cluster base URL and the path part of a raw URL.
pub fn join_path(base: &str, path: &str) -> String {
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Apply the substitution table to `raw_url` for a cluster reachable at
/// `base` under `scheme`.
pub fn apply_cluster_url(base: &str, scheme: &str, raw_url: &str) -> String {
    if raw_url == "/" {
        return base.to_string();
    }
    match split_url(raw_url) {
        None => join_path(base, raw_url),
        Some((s, _, path)) if s.eq_ignore_ascii_case(NAMED_CLUSTER_SCHEME) => join_path(base, path),
        Some((s, _, path)) if s.eq_ignore_ascii_case(scheme) => join_path(base, path),
        Some(_) => raw_url.to_string(),
    }
}

/// Check that a substituted URL parses. Variable tokens are masked first
/// since they are resolved later by the running step.
pub fn validate(url: &str) -> Result<()> {
    let masked: String = url
        .chars()
        .map(|c| if matches!(c, '$' | '{' | '}') { '/' } else { c })
        .collect();
    Url::parse(&masked)
        .map(|_| ())
        .map_err(|e| ClusterError::substitution(url, e.to_string()))
}
