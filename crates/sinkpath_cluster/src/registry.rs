//! Cluster registries: lookup of definitions by name.

use crate::definition::{ClusterDefinition, ClusterLookupResult};
use crate::error::{ClusterError, Result};
use crate::named_cluster::NamedCluster;
use serde::Deserialize;
use sinkpath_protocol::ResolutionContext;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Source of named cluster definitions.
///
/// Lookups have no side effects. The registry is shared and read-mostly;
/// callers synchronize any mutation themselves.
pub trait ClusterRegistry: Send + Sync {
    fn lookup_by_name(&self, name: &str, ctx: &ResolutionContext) -> ClusterLookupResult;

    /// Blank definition used to decode embedded copies.
    fn template(&self) -> Arc<dyn ClusterDefinition>;

    fn names(&self) -> Vec<String>;
}

/// Registry held entirely in memory.
#[derive(Debug, Clone)]
pub struct InMemoryRegistry {
    template: Arc<dyn ClusterDefinition>,
    clusters: BTreeMap<String, Arc<dyn ClusterDefinition>>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::with_template(Arc::new(NamedCluster::template()))
    }

    pub fn with_template(template: Arc<dyn ClusterDefinition>) -> Self {
        Self {
            template,
            clusters: BTreeMap::new(),
        }
    }

    pub fn with_cluster(self, cluster: NamedCluster) -> Self {
        self.with_definition(Arc::new(cluster))
    }

    pub fn with_definition(mut self, definition: Arc<dyn ClusterDefinition>) -> Self {
        self.insert(definition);
        self
    }

    /// Register `definition`, replacing any cluster of the same name.
    pub fn insert(&mut self, definition: Arc<dyn ClusterDefinition>) -> Option<Arc<dyn ClusterDefinition>> {
        self.clusters
            .insert(definition.name().to_string(), definition)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ClusterDefinition>> {
        self.clusters.remove(name)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl ClusterRegistry for InMemoryRegistry {
    fn lookup_by_name(&self, name: &str, ctx: &ResolutionContext) -> ClusterLookupResult {
        let found = self.clusters.get(name).cloned();
        debug!(
            cluster = name,
            meta_store = ?ctx.meta_store().map(|m| m.as_str()),
            found = found.is_some(),
            "Cluster lookup"
        );
        found.into()
    }

    fn template(&self) -> Arc<dyn ClusterDefinition> {
        Arc::clone(&self.template)
    }

    fn names(&self) -> Vec<String> {
        self.clusters.keys().cloned().collect()
    }
}

/// On-disk layout of `clusters.toml`.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    template: Option<NamedCluster>,
    #[serde(default)]
    cluster: Vec<NamedCluster>,
}

/// Registry loaded from a TOML file:
///
/// ```toml
/// [template]
/// hdfs_port = "8020"
///
/// [[cluster]]
/// name = "prod"
/// hdfs_host = "nn1.example.com"
/// ```
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
    inner: InMemoryRegistry,
}

impl FileRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ClusterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            clusters = registry.inner.len(),
            "Loaded cluster registry"
        );
        Ok(Self {
            path: path.to_path_buf(),
            ..registry
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| ClusterError::Registry(e.to_string()))?;

        let template = file.template.unwrap_or_else(NamedCluster::template);
        let mut inner = InMemoryRegistry::with_template(Arc::new(template));
        for cluster in file.cluster {
            if cluster.name.trim().is_empty() {
                return Err(ClusterError::Registry(
                    "cluster entry without a name".to_string(),
                ));
            }
            let name = cluster.name.clone();
            if inner.insert(Arc::new(cluster)).is_some() {
                return Err(ClusterError::Registry(format!(
                    "duplicate cluster name '{}'",
                    name
                )));
            }
        }

        Ok(Self {
            path: PathBuf::new(),
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ClusterRegistry for FileRegistry {
    fn lookup_by_name(&self, name: &str, ctx: &ResolutionContext) -> ClusterLookupResult {
        self.inner.lookup_by_name(name, ctx)
    }

    fn template(&self) -> Arc<dyn ClusterDefinition> {
        self.inner.template()
    }

    fn names(&self) -> Vec<String> {
        self.inner.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_blank_names_are_not_found() {
        let registry = InMemoryRegistry::new()
            .with_cluster(NamedCluster::template().derive("prod").with_hdfs("nn", "8020"));
        let ctx = ResolutionContext::online();
        assert!(registry.lookup_by_name("prod", &ctx).is_found());
        assert!(!registry.lookup_by_name("gone", &ctx).is_found());
        assert!(!registry.lookup_by_name("", &ctx).is_found());
    }

    #[test]
    fn from_toml_reads_template_and_clusters() {
        let registry = FileRegistry::from_toml(
            r#"
[template]
hdfs_port = "9000"

[[cluster]]
name = "prod"
hdfs_host = "nn1"
hdfs_port = "8020"

[[cluster]]
name = "dev"
hdfs_host = "devnn"
"#,
        )
        .unwrap();
        assert_eq!(registry.names(), vec!["dev".to_string(), "prod".to_string()]);

        let template = registry.template();
        let decoded = template
            .from_xml_for_embed("<NamedCluster><hdfs_host>h</hdfs_host></NamedCluster>")
            .unwrap();
        assert_eq!(
            decoded.substitute("/a", &ResolutionContext::offline()).unwrap(),
            "hdfs://h:9000/a"
        );
    }

    #[test]
    fn from_toml_rejects_duplicates() {
        let err = FileRegistry::from_toml(
            r#"
[[cluster]]
name = "prod"

[[cluster]]
name = "prod"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ClusterError::Registry(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn load_reads_registry_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.toml");
        std::fs::write(
            &path,
            "[[cluster]]\nname = \"prod\"\nhdfs_host = \"nn1\"\n",
        )
        .unwrap();

        let registry = FileRegistry::load(&path).unwrap();
        assert_eq!(registry.path(), path.as_path());
        assert_eq!(registry.names(), vec!["prod".to_string()]);
        let ctx = ResolutionContext::online();
        match registry.lookup_by_name("prod", &ctx) {
            ClusterLookupResult::Found(cluster) => assert_eq!(
                cluster.substitute("/a", &ctx).unwrap(),
                "hdfs://nn1:8020/a"
            ),
            ClusterLookupResult::NotFound => panic!("prod should be registered"),
        }
    }

    #[test]
    fn load_of_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = FileRegistry::load(&path).unwrap_err();
        assert!(matches!(err, ClusterError::Io { path: ref p, .. } if p == &path));
    }
}
