//! Configuration, registry, and step loading shared by all commands.

use super::error::HelpfulError;
use anyhow::{Context, Result};
use sinkpath_cluster::{ClusterRegistry, FileRegistry, InMemoryRegistry};
use sinkpath_protocol::{paths, MetaStoreHandle, ResolutionContext, SystemConfig};
use sinkpath_step::{load_step_resource, FileOutputMeta, StepError};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct CliContext {
    pub config: SystemConfig,
    pub registry: Arc<dyn ClusterRegistry>,
}

impl CliContext {
    /// Load the config (explicit path must exist) and the registry it points at.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) if !path.exists() => {
                return Err(HelpfulError::config_not_found(path).into())
            }
            Some(path) => SystemConfig::load(path)?,
            None => SystemConfig::load_or_default(&paths::default_config_path())?,
        };

        let registry = load_registry(&config.registry_path)?;
        Ok(Self { config, registry })
    }

    /// Resolution context from config, with command-line overrides applied.
    pub fn resolution_context(&self, offline: bool, vars: &[(String, String)]) -> ResolutionContext {
        let mut variables = self.config.variables.clone();
        for (key, value) in vars {
            variables.set(key.clone(), value.clone());
        }
        let ctx = ResolutionContext::new(self.config.registry_enabled && !offline)
            .with_variables(variables);
        match &self.config.meta_store {
            Some(location) => ctx.with_meta_store(MetaStoreHandle::new(location.clone())),
            None => ctx,
        }
    }

    /// Read a step definition file into a fresh step bound to the registry.
    pub fn load_step(&self, path: &Path) -> Result<FileOutputMeta> {
        let node = match load_step_resource(path) {
            Ok(node) => node,
            Err(StepError::ResourceNotFound(_)) => {
                return Err(HelpfulError::step_not_found(path).into())
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to load step {}", path.display()))
            }
        };
        let mut meta = FileOutputMeta::new(Arc::clone(&self.registry));
        meta.read_data(&node)
            .with_context(|| format!("Invalid step definition {}", path.display()))?;
        Ok(meta)
    }
}

fn load_registry(path: &Path) -> Result<Arc<dyn ClusterRegistry>> {
    if path.exists() {
        let registry = FileRegistry::load(path)
            .with_context(|| format!("Failed to load cluster registry {}", path.display()))?;
        Ok(Arc::new(registry))
    } else {
        info!(path = %path.display(), "No cluster registry file; starting with an empty registry");
        Ok(Arc::new(InMemoryRegistry::new()))
    }
}

/// Parse a `KEY=VALUE` variable argument.
pub fn parse_var(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => {
            warn!(arg = raw, "Rejected variable argument");
            Err(HelpfulError::invalid_variable(raw).message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn context_in(dir: &TempDir, config: &str, clusters: Option<&str>) -> CliContext {
        let registry_path = dir.path().join("clusters.toml");
        if let Some(clusters) = clusters {
            fs::write(&registry_path, clusters).unwrap();
        }
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            format!(
                "registry_path = {:?}\n{}",
                registry_path.display().to_string(),
                config
            ),
        )
        .unwrap();
        CliContext::load(Some(&config_path)).unwrap()
    }

    #[test]
    fn parse_var_splits_on_first_equals() {
        assert_eq!(
            parse_var("URL=a=b").unwrap(),
            ("URL".to_string(), "a=b".to_string())
        );
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn missing_explicit_config_is_helpful_error() {
        let dir = TempDir::new().unwrap();
        let err = CliContext::load(Some(&dir.path().join("absent.toml")))
            .err()
            .unwrap();
        assert!(err.downcast_ref::<HelpfulError>().is_some());
    }

    #[test]
    fn missing_registry_file_gives_empty_registry() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir, "", None);
        assert!(ctx.registry.names().is_empty());
    }

    #[test]
    fn offline_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(
            &dir,
            "meta_store = \"memory\"\n[variables]\nDAY = \"mon\"\n",
            Some("[[cluster]]\nname = \"prod\"\nhdfs_host = \"nn1\"\n"),
        );
        assert_eq!(ctx.registry.names(), vec!["prod".to_string()]);

        let online = ctx.resolution_context(false, &[]);
        assert!(online.registry_available());

        let offline = ctx.resolution_context(true, &[("DAY".into(), "tue".into())]);
        assert!(!offline.registry_available());
        assert_eq!(offline.variables().get("DAY"), Some("tue"));
        assert_eq!(offline.meta_store().map(|m| m.as_str()), Some("memory"));
    }
}
