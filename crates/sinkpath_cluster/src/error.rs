//! Error types for cluster definitions and registries.

use sinkpath_protocol::XmlError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Debug, Error)]
pub enum ClusterError {
    /// Embedded fragment does not describe a cluster under the expected tag.
    #[error("Malformed embedded cluster definition <{tag}>: {reason}")]
    MalformedEmbeddedDefinition { tag: String, reason: String },

    /// Substitution produced something that is not a URL.
    #[error("Cluster substitution for '{url}' failed: {reason}")]
    Substitution { url: String, reason: String },

    #[error("Cluster field '{field}' references undefined variable ${{{variable}}}")]
    UnresolvedVariable { field: String, variable: String },

    #[error("Cluster registry error: {0}")]
    Registry(String),

    #[error("Failed to read cluster registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Xml(#[from] XmlError),
}

impl ClusterError {
    pub fn malformed(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEmbeddedDefinition {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    pub fn substitution(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Substitution {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
