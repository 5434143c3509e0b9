//! Hand-written registry and cluster doubles for step tests.

#![allow(dead_code)]

use sinkpath_cluster::{ClusterDefinition, ClusterLookupResult, ClusterRegistry, Result};
use sinkpath_protocol::ResolutionContext;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cluster whose behavior is fixed up front.
#[derive(Debug, Default)]
pub struct StubCluster {
    pub name: String,
    /// Returned by `substitute`; `None` prefixes the raw URL with `stub:`.
    pub substituted: Option<String>,
    /// Returned by `to_xml_for_embed`.
    pub embed_xml: Option<String>,
    /// Returned by `from_xml_for_embed`.
    pub decodes_to: Option<Arc<StubCluster>>,
    pub substitute_calls: AtomicUsize,
    pub decode_calls: AtomicUsize,
}

impl StubCluster {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn substituting_to(mut self, url: &str) -> Self {
        self.substituted = Some(url.to_string());
        self
    }

    pub fn embedding_as(mut self, xml: &str) -> Self {
        self.embed_xml = Some(xml.to_string());
        self
    }

    pub fn decoding_to(mut self, decoded: Arc<StubCluster>) -> Self {
        self.decodes_to = Some(decoded);
        self
    }

    pub fn substitute_calls(&self) -> usize {
        self.substitute_calls.load(Ordering::SeqCst)
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.load(Ordering::SeqCst)
    }
}

impl ClusterDefinition for StubCluster {
    fn name(&self) -> &str {
        &self.name
    }

    fn substitute(&self, raw_url: &str, _ctx: &ResolutionContext) -> Result<String> {
        self.substitute_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.substituted {
            Some(url) => url.clone(),
            None => format!("stub:{}", raw_url),
        })
    }

    fn to_xml_for_embed(&self, tag: &str) -> Result<String> {
        Ok(match &self.embed_xml {
            Some(xml) => xml.clone(),
            None => format!("<{tag}><name>{}</name></{tag}>", self.name),
        })
    }

    fn from_xml_for_embed(&self, _fragment: &str) -> Result<Arc<dyn ClusterDefinition>> {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.decodes_to {
            Some(decoded) => Arc::clone(decoded) as Arc<dyn ClusterDefinition>,
            None => Arc::new(StubCluster::named(&self.name)),
        })
    }
}

/// Registry that counts lookups.
#[derive(Debug, Default)]
pub struct StubRegistry {
    pub template: Arc<StubCluster>,
    pub clusters: HashMap<String, Arc<StubCluster>>,
    pub lookups: AtomicUsize,
}

impl StubRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template: Arc<StubCluster>) -> Self {
        self.template = template;
        self
    }

    pub fn with_cluster(mut self, cluster: Arc<StubCluster>) -> Self {
        self.clusters.insert(cluster.name.clone(), cluster);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ClusterRegistry for StubRegistry {
    fn lookup_by_name(&self, name: &str, _ctx: &ResolutionContext) -> ClusterLookupResult {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match self.clusters.get(name) {
            Some(cluster) => ClusterLookupResult::Found(Arc::clone(cluster) as Arc<dyn ClusterDefinition>),
            None => ClusterLookupResult::NotFound,
        }
    }

    fn template(&self) -> Arc<dyn ClusterDefinition> {
        Arc::clone(&self.template) as Arc<dyn ClusterDefinition>
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clusters.keys().cloned().collect();
        names.sort();
        names
    }
}
