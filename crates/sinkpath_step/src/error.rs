//! Error types for the output step.

use sinkpath_cluster::ClusterError;
use sinkpath_protocol::{AttributeError, XmlError};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StepError>;

#[derive(Debug, Error)]
pub enum StepError {
    /// A step definition file that must exist does not.
    #[error("Resource not found: {0}")]
    ResourceNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

impl StepError {
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
