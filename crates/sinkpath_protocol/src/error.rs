//! Error types shared by the protocol layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing or navigating XML step definitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("Missing element <{0}>")]
    MissingElement(String),

    #[error("Expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot { expected: String, found: String },
}

impl XmlError {
    pub(crate) fn parse(err: impl std::fmt::Display) -> Self {
        XmlError::Parse(err.to_string())
    }
}

/// Errors raised by a flat step attribute store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Invalid value for step attribute '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Attribute store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while loading system configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
