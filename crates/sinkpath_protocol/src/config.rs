//! System configuration for resolving sink locations.

use crate::error::ConfigError;
use crate::paths;
use crate::types::{MetaStoreHandle, ResolutionContext, VariableSpace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Whether the central cluster registry is reachable. When false,
    /// steps resolve through their embedded cluster definitions.
    #[serde(default = "default_registry_enabled")]
    pub registry_enabled: bool,

    /// TOML file holding registered clusters.
    #[serde(default = "paths::default_registry_path")]
    pub registry_path: PathBuf,

    /// Metadata store location handed to registry lookups.
    #[serde(default)]
    pub meta_store: Option<String>,

    /// Variables for `${NAME}` expansion in cluster connection fields.
    /// Tokens in a step's URL path are left for the running step.
    #[serde(default)]
    pub variables: VariableSpace,
}

fn default_registry_enabled() -> bool {
    true
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            registry_enabled: default_registry_enabled(),
            registry_path: paths::default_registry_path(),
            meta_store: None,
            variables: VariableSpace::new(),
        }
    }
}

impl SystemConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Build the per-call resolution context described by this config.
    pub fn resolution_context(&self) -> ResolutionContext {
        let ctx = ResolutionContext::new(self.registry_enabled)
            .with_variables(self.variables.clone());
        match &self.meta_store {
            Some(location) => ctx.with_meta_store(MetaStoreHandle::new(location.clone())),
            None => ctx,
        }
    }
}
